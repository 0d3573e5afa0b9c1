use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;

/// 逻辑角色到具体 AgentId 的绑定
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleBinding {
    pub coordinator: AgentId,
    pub analyst: AgentId,
    pub decision_maker: AgentId,
}

impl Default for RoleBinding {
    fn default() -> Self {
        Self {
            coordinator: AgentId::from("coordinator"),
            analyst: AgentId::from("analyst"),
            decision_maker: AgentId::from("decision_maker"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionMode {
    /// 按注册顺序依次处理；后面的 agent 能看到同一轮先路由的消息
    #[default]
    Sequential,
    /// 轮次开始时快照所有收件箱并发处理，全部完成后按注册顺序路由
    Concurrent { max_concurrency: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    pub rounds: u32,
    pub handler_timeout_ms: Option<u64>,
    pub mode: ExecutionMode,
}

impl OrchestrationConfig {
    pub const DEFAULT_ROUNDS: u32 = 3;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    /// 单条消息的处理时限
    ///
    /// 超时的 handler 记为失败，回复被丢弃。阻塞线程的 handler 无法被提前打断，
    /// 只能在返回后按耗时判定超时。
    pub fn with_handler_timeout(mut self, limit: Duration) -> Self {
        self.handler_timeout_ms = Some(limit.as_millis() as u64);
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn concurrent(self, max_concurrency: usize) -> Self {
        self.with_mode(ExecutionMode::Concurrent {
            max_concurrency: max_concurrency.max(1),
        })
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            rounds: Self::DEFAULT_ROUNDS,
            handler_timeout_ms: None,
            mode: ExecutionMode::default(),
        }
    }
}
