// 状态管理模块

mod knowledge;
mod system;

pub use knowledge::Knowledge;
pub use system::{
    AgentSnapshot, FailureReason, HandlerFailure, RouteOutcome, RoutedMessage, SystemState,
};
