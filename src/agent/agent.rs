use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::Knowledge;

use super::message::{AgentId, Message, MessageKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Analyst,
    DecisionMaker,
    Coordinator,
    Generic,
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            AgentRole::Analyst => "analyst",
            AgentRole::DecisionMaker => "decision_maker",
            AgentRole::Coordinator => "coordinator",
            AgentRole::Generic => "generic",
        };
        f.write_str(tag)
    }
}

/// handler 调用时可见的上下文
#[derive(Clone, Copy)]
pub struct AgentContext<'a> {
    pub id: &'a AgentId,
    pub knowledge: &'a Knowledge,
    pub round: u32,
}

impl<'a> AgentContext<'a> {
    pub fn id(&self) -> &'a AgentId {
        self.id
    }

    pub fn knowledge(&self) -> &'a Knowledge {
        self.knowledge
    }

    /// 以当前 Agent 为发送方构造消息，由协调者负责路由
    pub fn send(
        &self,
        receiver: impl Into<AgentId>,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Message {
        Message::new(self.id.clone(), receiver, content, kind)
    }
}

/// Agent 能力接口：只决定回复什么，不负责路由
#[async_trait]
pub trait Agent: Send + Sync {
    fn role(&self) -> AgentRole {
        AgentRole::Generic
    }

    async fn handle(&self, message: Message, ctx: &AgentContext<'_>) -> Result<Option<Message>>;
}
