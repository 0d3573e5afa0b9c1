use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::agent::{
    Agent, AgentContext, AgentFactoryRegistry, AgentId, AgentRole, Message, MessageKind,
};
use crate::analysis::{
    DynAnalysisProvider, FixedTrendProvider, MockDataSource, RandomTrendProvider,
    SeriesTrendProvider, TrendLabel,
};
use crate::config::RoleBinding;
use crate::error::{AgentMeshError, Result};

mod policy;

pub use policy::Decision;

pub const INSIGHTS_KEY: &str = "insights";
pub const DECISIONS_KEY: &str = "decisions";

/// 通用 Agent：接收所有消息，不回复
#[derive(Clone, Copy, Debug, Default)]
pub struct GenericAgent {
    role: Option<AgentRole>,
}

impl GenericAgent {
    pub fn new() -> Self {
        Self { role: None }
    }

    pub fn with_role(role: AgentRole) -> Self {
        Self { role: Some(role) }
    }
}

#[async_trait]
impl Agent for GenericAgent {
    fn role(&self) -> AgentRole {
        self.role.unwrap_or(AgentRole::Generic)
    }

    async fn handle(&self, message: Message, ctx: &AgentContext<'_>) -> Result<Option<Message>> {
        debug!(
            agent = %ctx.id(),
            kind = %message.kind(),
            from = %message.sender(),
            "message absorbed"
        );
        Ok(None)
    }
}

/// 数据分析 Agent：响应 `data_request`
pub struct DataAnalyst {
    provider: DynAnalysisProvider,
    forward_to: Option<AgentId>,
}

impl DataAnalyst {
    pub fn new(provider: DynAnalysisProvider) -> Self {
        Self {
            provider,
            forward_to: None,
        }
    }

    /// 把分析结果发给 `target`，而不是回复请求方
    pub fn forward_to(mut self, target: impl Into<AgentId>) -> Self {
        self.forward_to = Some(target.into());
        self
    }
}

#[async_trait]
impl Agent for DataAnalyst {
    fn role(&self) -> AgentRole {
        AgentRole::Analyst
    }

    async fn handle(&self, message: Message, ctx: &AgentContext<'_>) -> Result<Option<Message>> {
        match message.kind() {
            MessageKind::DataRequest => {
                let trend = self.provider.classify(message.content()).await?;
                let insight = format!("Analysis shows trend: {trend}");
                ctx.knowledge().append(INSIGHTS_KEY, insight.clone());
                let receiver = self
                    .forward_to
                    .clone()
                    .unwrap_or_else(|| message.sender().clone());
                info!(agent = %ctx.id(), %trend, to = %receiver, "analysis produced");
                Ok(Some(ctx.send(receiver, insight, MessageKind::AnalysisResult)))
            }
            _ => Ok(None),
        }
    }
}

/// 决策 Agent：响应 `analysis_result`，决策发送给协调者
pub struct DecisionMaker {
    report_to: AgentId,
}

impl DecisionMaker {
    pub fn new(report_to: impl Into<AgentId>) -> Self {
        Self {
            report_to: report_to.into(),
        }
    }
}

#[async_trait]
impl Agent for DecisionMaker {
    fn role(&self) -> AgentRole {
        AgentRole::DecisionMaker
    }

    async fn handle(&self, message: Message, ctx: &AgentContext<'_>) -> Result<Option<Message>> {
        match message.kind() {
            MessageKind::AnalysisResult => {
                let decision = Decision::from_analysis(message.content());
                ctx.knowledge().append(DECISIONS_KEY, decision.as_str());
                info!(agent = %ctx.id(), decision = decision.as_str(), "decision made");
                Ok(Some(ctx.send(
                    self.report_to.clone(),
                    format!("Decision: {decision}"),
                    MessageKind::Decision,
                )))
            }
            _ => Ok(None),
        }
    }
}

fn extract_config<T: DeserializeOwned>(value: Option<Value>) -> Result<T> {
    let normalized = value.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    serde_json::from_value(normalized).map_err(|e| AgentMeshError::Other(anyhow!(e)))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "lowercase")]
enum ProviderKind {
    #[default]
    Random,
    Fixed,
    Series,
}

#[derive(Deserialize)]
struct AnalystConf {
    #[serde(default)]
    provider: ProviderKind,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    trend: Option<TrendLabel>,
    #[serde(default)]
    datasets: std::collections::HashMap<String, Vec<f64>>,
    #[serde(default)]
    default_series: Option<Vec<f64>>,
    #[serde(default)]
    tolerance: Option<f64>,
    #[serde(default)]
    forward_to: Option<AgentId>,
}

fn build_provider(conf: &AnalystConf) -> Result<DynAnalysisProvider> {
    let provider: DynAnalysisProvider = match conf.provider {
        ProviderKind::Random => match conf.seed {
            Some(seed) => Arc::new(RandomTrendProvider::seeded(seed)),
            None => Arc::new(RandomTrendProvider::new()),
        },
        ProviderKind::Fixed => {
            let trend = conf.trend.ok_or_else(|| {
                AgentMeshError::Config("`fixed` provider requires a `trend`".into())
            })?;
            Arc::new(FixedTrendProvider(trend))
        }
        ProviderKind::Series => {
            let mut source = MockDataSource::new();
            for (name, series) in &conf.datasets {
                source = source.with_dataset(name.clone(), series.clone());
            }
            if let Some(series) = &conf.default_series {
                source = source.with_default_series(series.clone());
            }
            let mut provider = SeriesTrendProvider::new(Arc::new(source));
            if let Some(tolerance) = conf.tolerance {
                provider = provider.with_tolerance(tolerance);
            }
            Arc::new(provider)
        }
    };
    Ok(provider)
}

pub fn register_builtin_agent_factories(registry: &mut AgentFactoryRegistry) {
    registry.register_factory(
        "generic",
        Arc::new(|_bindings: &RoleBinding, _config: Option<Value>| {
            Ok(Arc::new(GenericAgent::new()) as Arc<dyn Agent>)
        }),
    );

    registry.register_factory(
        "data_analyst",
        Arc::new(|_bindings: &RoleBinding, config: Option<Value>| {
            let conf: AnalystConf = extract_config(config)?;
            let mut analyst = DataAnalyst::new(build_provider(&conf)?);
            if let Some(target) = conf.forward_to {
                analyst = analyst.forward_to(target);
            }
            Ok(Arc::new(analyst) as Arc<dyn Agent>)
        }),
    );

    registry.register_factory(
        "decision_maker",
        Arc::new(|bindings: &RoleBinding, config: Option<Value>| {
            #[derive(Deserialize)]
            struct Conf {
                #[serde(default)]
                report_to: Option<AgentId>,
            }
            let conf: Conf = extract_config(config)?;
            let report_to = conf
                .report_to
                .unwrap_or_else(|| bindings.coordinator.clone());
            Ok(Arc::new(DecisionMaker::new(report_to)) as Arc<dyn Agent>)
        }),
    );
}
