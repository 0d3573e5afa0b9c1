use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Agent 名称，在注册表内唯一
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AgentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&AgentId> for AgentId {
    fn from(value: &AgentId) -> Self {
        value.clone()
    }
}

impl Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AgentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    Info,
    Request,
    Response,
    DataRequest,
    AnalysisResult,
    Decision,
    Custom(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Info => "info",
            MessageKind::Request => "request",
            MessageKind::Response => "response",
            MessageKind::DataRequest => "data_request",
            MessageKind::AnalysisResult => "analysis_result",
            MessageKind::Decision => "decision",
            MessageKind::Custom(tag) => tag,
        }
    }
}

impl From<String> for MessageKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "info" => MessageKind::Info,
            "request" => MessageKind::Request,
            "response" => MessageKind::Response,
            "data_request" => MessageKind::DataRequest,
            "analysis_result" => MessageKind::AnalysisResult,
            "decision" => MessageKind::Decision,
            _ => MessageKind::Custom(value),
        }
    }
}

impl From<&str> for MessageKind {
    fn from(value: &str) -> Self {
        MessageKind::from(value.to_string())
    }
}

impl From<MessageKind> for String {
    fn from(value: MessageKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agent 之间传递的消息，构造后不可变
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    sender: AgentId,
    receiver: AgentId,
    content: String,
    #[serde(rename = "type")]
    kind: MessageKind,
}

impl Message {
    pub fn new(
        sender: impl Into<AgentId>,
        receiver: impl Into<AgentId>,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            content: content.into(),
            kind,
        }
    }

    pub fn info(
        sender: impl Into<AgentId>,
        receiver: impl Into<AgentId>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(sender, receiver, content, MessageKind::Info)
    }

    pub fn sender(&self) -> &AgentId {
        &self.sender
    }

    pub fn receiver(&self) -> &AgentId {
        &self.receiver
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }
}
