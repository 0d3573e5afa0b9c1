pub mod env;
pub mod orchestration;
pub mod system;

pub use env::EnvConfig;
pub use orchestration::{ExecutionMode, OrchestrationConfig, RoleBinding};
pub use system::{AgentConfig, SystemConfig};
