use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::RoleBinding;
use crate::error::{AgentMeshError, Result};

use super::agent::Agent;
use super::builtin::register_builtin_agent_factories;

pub type AgentFactory =
    Arc<dyn Fn(&RoleBinding, Option<Value>) -> Result<Arc<dyn Agent>> + Send + Sync>;

/// 按类型名构建 Agent
#[derive(Default)]
pub struct AgentFactoryRegistry {
    factories: BTreeMap<String, AgentFactory>,
}

impl AgentFactoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtin_agent_factories(&mut registry);
        registry
    }

    pub fn register_factory<T: Into<String>>(&mut self, kind: T, factory: AgentFactory) {
        self.factories.insert(kind.into(), factory);
    }

    pub fn build(
        &self,
        kind: &str,
        bindings: &RoleBinding,
        config: Option<Value>,
    ) -> Result<Arc<dyn Agent>> {
        let builder = self
            .factories
            .get(kind)
            .ok_or_else(|| AgentMeshError::UnknownAgentKind(kind.to_string()))?;
        builder(bindings, config)
    }

    pub fn has_factory(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
