//! Convenient re-exports of the most commonly used items.
//!
//! ```rust
//! use docchat_core::prelude::*;
//! ```

pub use crate::config::{AppConfig, LlmConfig, ServerConfig, WorkflowConfig};
pub use crate::error::{DocchatError, Result};
pub use crate::traits::{ChatLlm, Retriever};
pub use crate::types::{
    ChatMessage, LlmStream, LlmStreamUnit, MessageRole, Node, Query, ScoredNode, ToolCall,
    ToolDefinition,
};
