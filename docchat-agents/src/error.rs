//! Error types for the docchat agent workflow.

use docchat_core::DocchatError;
use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Error types for workflow and agent operations
#[derive(Error, Debug)]
pub enum AgentError {
    /// Core docchat errors (LLM, retrieval, configuration)
    #[error("Core error: {0}")]
    Core(#[from] DocchatError),

    /// Tool-related errors
    #[error("Tool error: {tool_name} - {message}")]
    Tool {
        /// Tool name
        tool_name: String,
        /// Error message
        message: String,
    },

    /// Workflow engine errors
    #[error("Workflow error: {workflow} - {message}")]
    Workflow {
        /// Workflow name
        workflow: String,
        /// Error message
        message: String,
    },

    /// A handler failed and aborted its run
    #[error("Handler '{handler}' failed: {message}")]
    HandlerFailed {
        /// Handler name
        handler: String,
        /// Error message
        message: String,
    },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation {
        /// Field name
        field: String,
        /// Error message
        message: String,
    },

    /// The run was cancelled
    #[error("Run cancelled")]
    Cancelled,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("Agent error: {message}")]
    Generic {
        /// Error message
        message: String,
    },
}

impl AgentError {
    /// Create a tool error
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Create a workflow error
    pub fn workflow(workflow: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Workflow {
            workflow: workflow.into(),
            message: message.into(),
        }
    }

    /// Create a handler failure
    pub fn handler_failed(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HandlerFailed {
            handler: handler.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Core(inner) => inner.category(),
            Self::Tool { .. } => "tool",
            Self::Workflow { .. } => "workflow",
            Self::HandlerFailed { .. } => "handler",
            Self::Validation { .. } => "validation",
            Self::Cancelled => "cancelled",
            Self::Serialization(_) => "serialization",
            Self::Generic { .. } => "generic",
        }
    }
}

// Convert from anyhow errors
impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::generic(format!("Anyhow error: {err}"))
    }
}
