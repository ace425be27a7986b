//! Types describing a streaming chat completion.

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::{Result, ToolCall};

/// One incremental unit emitted by a streaming LLM call.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmStreamUnit {
    /// A fragment of assistant text.
    TextDelta(String),
    /// A fully assembled tool invocation request.
    ToolCall(ToolCall),
}

/// Stream of incremental LLM output units.
pub type LlmStream = Pin<Box<dyn Stream<Item = Result<LlmStreamUnit>> + Send>>;

/// A tool advertised to the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name the model uses to call it
    pub name: String,
    /// Natural-language description shown to the model
    pub description: String,
    /// JSON schema of the tool arguments
    pub parameters: serde_json::Value,
}
