pub mod agent;
pub mod analysis;
pub mod config;
pub mod error;
pub mod runtime;
pub mod state;
pub mod utils;

pub use agent::{
    Agent, AgentCell, AgentContext, AgentFactory, AgentFactoryRegistry, AgentId, AgentRegistry,
    AgentRole, DataAnalyst, Decision, DecisionMaker, GenericAgent, Mailbox, Message, MessageKind,
};
pub use analysis::{
    AnalysisProvider, DataSource, DynAnalysisProvider, DynDataSource, FallbackDataSource,
    FixedTrendProvider, MockDataSource, RandomTrendProvider, SeriesTrendProvider, TrendLabel,
};
pub use config::{
    AgentConfig, EnvConfig, ExecutionMode, OrchestrationConfig, RoleBinding, SystemConfig,
};
pub use error::{AgentMeshError, Result};
pub use runtime::{Coordinator, DrainOutcome};
pub use state::{
    AgentSnapshot, FailureReason, HandlerFailure, Knowledge, RouteOutcome, RoutedMessage,
    SystemState,
};
pub use utils::logging;
