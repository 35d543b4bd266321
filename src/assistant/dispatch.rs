//! Assistant turn state machine.
//!
//! Idle -> AwaitingModel(initial) -> [ExecutingTool -> AwaitingModel(follow-up)] -> Idle
//!
//! The dispatcher never awaits. `submit` hands back the request to send and
//! `complete` consumes the model's answer, returning a follow-up request when a
//! tool ran. Between the two the driver is free to keep ticking.

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::protocol::{ModelReply, ModelRequest};
use super::transcript::{ToolCall, ToolResponse, ToolResult, Transcript};
use crate::error::{DispatchError, ModelError};

pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";
pub const NO_RESPONSE_REPLY: &str = "I don't have a response for that. Could you please rephrase?";

/// Runs a decoded tool call against the cluster.
pub trait ToolExecutor {
    fn invoke(&mut self, call: &ToolCall) -> ToolResponse;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initial,
    FollowUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingModel { turn: Uuid, stage: Stage },
    ExecutingTool { turn: Uuid },
}

#[derive(Debug)]
pub struct Dispatcher {
    phase: Phase,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True from submission until the turn's final message is appended.
    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Appends the user message and opens a turn.
    pub fn submit(&mut self, transcript: &mut Transcript, text: &str) -> Result<ModelRequest, DispatchError> {
        if self.is_loading() {
            return Err(DispatchError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(DispatchError::EmptyMessage);
        }

        transcript.push_user(text);
        let turn = Uuid::new_v4();
        self.phase = Phase::AwaitingModel { turn, stage: Stage::Initial };
        info!(%turn, "Turn opened");
        Ok(ModelRequest::from_transcript(transcript))
    }

    /// Consumes the model's answer for the open turn.
    pub fn complete<E: ToolExecutor>(
        &mut self,
        transcript: &mut Transcript,
        executor: &mut E,
        reply: Result<ModelReply, ModelError>,
    ) -> Option<ModelRequest> {
        let Phase::AwaitingModel { turn, stage } = self.phase else {
            warn!(phase = ?self.phase, "Model reply with no turn awaiting it; dropped");
            return None;
        };

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                warn!(%turn, error = %e, "Model call failed");
                transcript.push_assistant(FALLBACK_REPLY);
                self.phase = Phase::Idle;
                return None;
            }
        };

        match (stage, reply) {
            (Stage::Initial, ModelReply::ToolCalls(calls)) if !calls.is_empty() => {
                if calls.len() > 1 {
                    debug!(%turn, ignored = calls.len() - 1, "Only the first tool call is honored");
                }
                let Some(call) = calls.into_iter().next() else {
                    self.phase = Phase::Idle;
                    return None;
                };

                self.phase = Phase::ExecutingTool { turn };
                info!(%turn, tool = %call.name, "Executing tool call");
                let response = executor.invoke(&call);
                let result = ToolResult { name: call.name.clone(), response };
                transcript.push_exchange(call, result);

                self.phase = Phase::AwaitingModel { turn, stage: Stage::FollowUp };
                Some(ModelRequest::from_transcript(transcript))
            }
            (Stage::Initial, ModelReply::ToolCalls(_)) => {
                transcript.push_assistant(NO_RESPONSE_REPLY);
                self.close(turn)
            }
            (Stage::Initial, ModelReply::Text(text)) => {
                if text.trim().is_empty() {
                    transcript.push_assistant(NO_RESPONSE_REPLY);
                } else {
                    transcript.push_assistant(text);
                }
                self.close(turn)
            }
            (Stage::FollowUp, ModelReply::Text(text)) => {
                if !text.trim().is_empty() {
                    transcript.push_assistant(text);
                }
                self.close(turn)
            }
            (Stage::FollowUp, ModelReply::ToolCalls(calls)) => {
                debug!(%turn, count = calls.len(), "Follow-up tool calls are not chained");
                self.close(turn)
            }
        }
    }

    fn close(&mut self, turn: Uuid) -> Option<ModelRequest> {
        self.phase = Phase::Idle;
        info!(%turn, "Turn closed");
        None
    }
}
