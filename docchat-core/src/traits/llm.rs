//! Language model capability.

use async_trait::async_trait;

use crate::{ChatMessage, LlmStream, Result, ToolDefinition};

/// A chat model that streams its output and can request tool calls.
///
/// One client instance is shared by all concurrent runs; implementations must be
/// safe for concurrent invocation.
#[async_trait]
pub trait ChatLlm: Send + Sync + std::fmt::Debug {
    /// Start a streaming chat completion.
    ///
    /// The returned stream yields text fragments as they arrive and one
    /// [`LlmStreamUnit::ToolCall`](crate::LlmStreamUnit::ToolCall) per tool
    /// invocation the model requests.
    async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<LlmStream>;

    /// Generate a complete text answer for a single prompt.
    async fn generate_text(&self, prompt: &str) -> Result<String>;

    /// Name of the underlying model.
    fn model_name(&self) -> &str {
        "unknown"
    }
}
