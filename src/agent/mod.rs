pub mod agent;
pub mod builtin;
pub mod factory;
pub mod mailbox;
pub mod message;
pub mod registry;

pub use agent::{Agent, AgentContext, AgentRole};
pub use builtin::{DataAnalyst, Decision, DecisionMaker, GenericAgent};
pub use factory::{AgentFactory, AgentFactoryRegistry};
pub use mailbox::Mailbox;
pub use message::{AgentId, Message, MessageKind};
pub use registry::{AgentCell, AgentRegistry};
