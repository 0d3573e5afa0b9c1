// 运行时：路由与轮次调度

mod coordinator;
mod processor;
mod types;

pub use coordinator::Coordinator;
pub use processor::{drain_and_process, process_batch};
pub use types::DrainOutcome;
