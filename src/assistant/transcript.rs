use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GREETING: &str = "I am the Lead Systems Architect for AgriPulse. My knowledge base is configured for your specific hardware Bill of Materials. How can I help you with your edge-computing implementation today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self { name: name.into(), args }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Ok,
    Error,
}

/// Payload the model sees as the function response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub status: ToolStatus,
    pub detail: String,
}

impl ToolResponse {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self { status: ToolStatus::Ok, detail: detail.into() }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self { status: ToolStatus::Error, detail: detail.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub name: String,
    pub response: ToolResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResult>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into(), tool_call: None, tool_result: None }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, text: text.into(), tool_call: None, tool_result: None }
    }

    /// Protocol records are replayed to the model but never rendered.
    pub fn is_visible(&self) -> bool {
        self.tool_call.is_none() && self.tool_result.is_none()
    }
}

/// Ordered conversation history. Tool calls can only enter paired with their
/// result, so a call is always immediately followed by its result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Starts with the assistant greeting.
    pub fn new() -> Self {
        Self { messages: vec![Message::assistant(GREETING)] }
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    pub fn push_exchange(&mut self, call: ToolCall, result: ToolResult) {
        self.messages.push(Message {
            role: Role::Assistant,
            text: String::new(),
            tool_call: Some(call),
            tool_result: None,
        });
        self.messages.push(Message {
            role: Role::User,
            text: String::new(),
            tool_call: None,
            tool_result: Some(result),
        });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn visible(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.is_visible())
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
