//! Events exchanged by the chat agent handlers.

use crate::{
    parts::{DataPart, RunStatusEvent, SourceEvent, TextPart},
    workflow::WorkflowEvent,
};
use docchat_core::{ChatMessage, ToolCall};
use strum::EnumDiscriminants;

/// Input that starts a chat run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StartEvent {
    /// The latest user message
    pub user_input: String,
    /// Prior conversation, oldest first
    pub chat_history: Vec<ChatMessage>,
}

impl StartEvent {
    /// Create a start event
    pub fn new(user_input: impl Into<String>, chat_history: Vec<ChatMessage>) -> Self {
        Self {
            user_input: user_input.into(),
            chat_history,
        }
    }
}

/// Result of one tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallOutcome {
    /// Id of the tool call this answers
    pub tool_call_id: String,
    /// Name of the tool that ran
    pub tool_name: String,
    /// Text fed back to the model, or the error message
    pub result: String,
    /// Whether the call failed
    pub is_error: bool,
}

impl ToolCallOutcome {
    /// Successful outcome
    pub fn success(call: &ToolCall, result: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            result: result.into(),
            is_error: false,
        }
    }

    /// Failed outcome
    pub fn failure(call: &ToolCall, message: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            result: message.into(),
            is_error: true,
        }
    }
}

/// Every event a chat run can emit.
///
/// Control events (`Start`, `Continue`, tool bookkeeping, `Stop`) drive the
/// handlers; the remaining variants exist to be streamed to the client.
#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(AgentEventKind), derive(Hash))]
pub enum AgentEvent {
    /// Run input
    Start(StartEvent),
    /// Call the language model again
    Continue,
    /// The model asked for a tool call
    ToolCallRequested(ToolCall),
    /// A tool call finished
    ToolCallCompleted(ToolCallOutcome),
    /// Text block part
    Text(TextPart),
    /// Tool progress report
    RunStatus(RunStatusEvent),
    /// Sources used by a tool call
    SourceAttribution(SourceEvent),
    /// Follow-up questions
    Suggestion(Vec<String>),
    /// Any other data part
    Data(DataPart),
    /// End of run
    Stop,
}

impl WorkflowEvent for AgentEvent {
    type Kind = AgentEventKind;

    fn kind(&self) -> AgentEventKind {
        self.into()
    }

    fn is_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }
}
