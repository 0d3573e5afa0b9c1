use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::agent::{AgentFactoryRegistry, AgentId};
use crate::error::{AgentMeshError, Result};
use crate::runtime::Coordinator;

use super::orchestration::{OrchestrationConfig, RoleBinding};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: AgentId,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

/// 系统装配配置：角色绑定、编排参数、按注册顺序排列的 Agent 列表
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub bindings: RoleBinding,
    #[serde(default)]
    pub orchestration: OrchestrationConfig,
    pub agents: Vec<AgentConfig>,
}

impl SystemConfig {
    /// 市场分析预设：分析师 + 决策者
    pub fn market_analysis() -> Self {
        let bindings = RoleBinding::default();
        Self {
            agents: vec![
                AgentConfig {
                    name: bindings.analyst.clone(),
                    kind: "data_analyst".into(),
                    config: None,
                },
                AgentConfig {
                    name: bindings.decision_maker.clone(),
                    kind: "decision_maker".into(),
                    config: None,
                },
            ],
            bindings,
            orchestration: OrchestrationConfig::default(),
        }
    }

    /// 为分析师的随机 provider 设置种子
    ///
    /// 已有配置时合并 `seed` 字段；分析师使用非随机 provider 时报错。
    pub fn with_analyst_seed(mut self, seed: u64) -> Result<Self> {
        let analyst = self.bindings.analyst.clone();
        let entry = self
            .agents
            .iter_mut()
            .find(|agent| agent.name == analyst)
            .ok_or_else(|| {
                AgentMeshError::Config(format!("no agent named `{analyst}` to seed"))
            })?;
        let config = entry
            .config
            .get_or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| {
                AgentMeshError::Config(format!("config of `{analyst}` must be an object"))
            })?;
        match config.get("provider").and_then(Value::as_str) {
            None | Some("random") => {}
            Some(other) => {
                return Err(AgentMeshError::Config(format!(
                    "seed only applies to the random provider, `{analyst}` uses `{other}`"
                )))
            }
        }
        config.insert("seed".to_string(), Value::from(seed));
        Ok(self)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| AgentMeshError::Serialization(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// 构建协调者并按列表顺序注册 Agent
    ///
    /// 先校验所有 kind，任何一个未知时不构建任何 Agent。
    pub fn build(&self, factories: &AgentFactoryRegistry) -> Result<Coordinator> {
        if let Some(unknown) = self
            .agents
            .iter()
            .find(|agent| !factories.has_factory(&agent.kind))
        {
            return Err(AgentMeshError::UnknownAgentKind(unknown.kind.clone()));
        }
        let mut coordinator =
            Coordinator::new(self.bindings.clone()).with_config(self.orchestration.clone());
        for agent in &self.agents {
            let handler = factories.build(&agent.kind, &self.bindings, agent.config.clone())?;
            debug!(agent = %agent.name, kind = %agent.kind, "agent built from config");
            coordinator.register(agent.name.clone(), handler)?;
        }
        Ok(coordinator)
    }
}
