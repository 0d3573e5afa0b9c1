use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::agent::{AgentId, AgentRole, Message};

/// 路由结果
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteOutcome {
    Delivered,
    Dropped,
}

/// 路由历史中的一条记录，初始任务消息记在第 0 轮
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutedMessage {
    pub round: u32,
    pub message: Message,
    pub outcome: RouteOutcome,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    Error(String),
    Timeout { limit_ms: u64 },
    Panic(String),
}

/// handler 失败记录：该消息被丢弃，其余处理继续
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandlerFailure {
    pub round: u32,
    pub agent: AgentId,
    pub message: Message,
    pub reason: FailureReason,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub role: AgentRole,
    pub knowledge: Map<String, Value>,
    pub pending: Vec<Message>,
}

impl AgentSnapshot {
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.knowledge
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// 一次编排结束后的系统状态
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    pub task: String,
    pub rounds: u32,
    /// 按注册顺序排列的 Agent，最后是协调者
    pub agents: Vec<AgentSnapshot>,
    pub history: Vec<RoutedMessage>,
    pub failures: Vec<HandlerFailure>,
}

impl SystemState {
    pub fn agent(&self, id: &str) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    pub fn knowledge(&self, id: &str) -> Option<&Map<String, Value>> {
        self.agent(id).map(|agent| &agent.knowledge)
    }

    pub fn pending(&self, id: &str) -> &[Message] {
        self.agent(id)
            .map(|agent| agent.pending.as_slice())
            .unwrap_or_default()
    }

    pub fn delivered(&self) -> impl Iterator<Item = &Message> {
        self.history
            .iter()
            .filter(|entry| entry.outcome == RouteOutcome::Delivered)
            .map(|entry| &entry.message)
    }

    pub fn dropped(&self) -> impl Iterator<Item = &Message> {
        self.history
            .iter()
            .filter(|entry| entry.outcome == RouteOutcome::Dropped)
            .map(|entry| &entry.message)
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped().count()
    }

    pub fn routed_in_round(&self, round: u32) -> impl Iterator<Item = &RoutedMessage> {
        self.history.iter().filter(move |entry| entry.round == round)
    }

    pub fn is_quiescent(&self) -> bool {
        self.agents.iter().all(|agent| agent.pending.is_empty())
    }
}
