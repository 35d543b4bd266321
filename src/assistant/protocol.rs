use serde::Serialize;
use std::future::Future;

use super::tools::{tool_schemas, ToolSchema, SYSTEM_INSTRUCTION};
use super::transcript::{Role, ToolCall, ToolResult, Transcript};
use crate::error::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPart {
    Text(String),
    ToolCall(ToolCall),
    ToolResult(ToolResult),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelTurn {
    pub role: Role,
    pub part: TurnPart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRequest {
    pub system_instruction: &'static str,
    pub turns: Vec<ModelTurn>,
    pub tools: Vec<ToolSchema>,
}

impl ModelRequest {
    pub fn from_transcript(transcript: &Transcript) -> Self {
        let turns = transcript
            .messages()
            .iter()
            .filter_map(|message| {
                let part = match (&message.tool_call, &message.tool_result) {
                    (Some(call), _) => TurnPart::ToolCall(call.clone()),
                    (None, Some(result)) => TurnPart::ToolResult(result.clone()),
                    (None, None) if message.text.trim().is_empty() => return None,
                    (None, None) => TurnPart::Text(message.text.clone()),
                };
                Some(ModelTurn { role: message.role, part })
            })
            .collect();

        Self { system_instruction: SYSTEM_INSTRUCTION, turns, tools: tool_schemas() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Text(String),
    /// In the order the model produced them.
    ToolCalls(Vec<ToolCall>),
}

/// A generative model that can answer a request. The returned future owns
/// everything it needs, so the caller's session stays free while it runs.
pub trait ModelBackend: Send + Sync {
    fn generate(&self, request: ModelRequest) -> impl Future<Output = Result<ModelReply, ModelError>> + Send;
}
