use thiserror::Error;

use crate::agent::AgentId;

pub type Result<T> = std::result::Result<T, AgentMeshError>;

#[derive(Debug, Error)]
pub enum AgentMeshError {
    #[error("agent `{0}` already registered")]
    DuplicateAgent(AgentId),
    #[error("agent id `{0}` is reserved for the coordinator")]
    ReservedAgentId(AgentId),
    #[error("agent `{0}` not registered")]
    AgentNotRegistered(String),
    #[error("no agent or coordinator named `{0}`")]
    UnknownReceiver(AgentId),
    #[error("unknown agent kind `{0}`")]
    UnknownAgentKind(String),
    #[error("analysis error: {0}")]
    Analysis(String),
    #[error("data source error: {0}")]
    DataSource(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
