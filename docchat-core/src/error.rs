//! Error types for the docchat framework.
//!
//! This module provides the error type shared by every docchat crate. Capability
//! backends (retrievers, LLM clients) and configuration loading all report failures
//! through [`DocchatError`].

use thiserror::Error;

/// Core error types for docchat.
///
/// This enum covers the failure conditions that can occur while loading
/// configuration, retrieving documents, calling the language model, and
/// executing tools.
#[derive(Error, Debug)]
pub enum DocchatError {
    /// I/O related errors (file reading, network sockets, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document retrieval errors
    #[error("Retrieval error: {message}")]
    Retrieval {
        /// Detailed error message
        message: String,
    },

    /// LLM call errors
    #[error("LLM error: {message}")]
    Llm {
        /// Detailed error message
        message: String,
    },

    /// Tool execution errors
    #[error("Tool error: {tool_name} - {message}")]
    Tool {
        /// Name of the failing tool
        tool_name: String,
        /// Detailed error message
        message: String,
    },

    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Configuration {
        /// Detailed error message
        message: String,
    },

    /// Input validation errors
    #[error("Validation error: {message}")]
    Validation {
        /// Detailed error message
        message: String,
    },

    /// Resource not found errors
    #[error("Not found: {resource}")]
    NotFound {
        /// Name of the missing resource
        resource: String,
    },

    /// Internal framework errors
    #[error("Internal error: {message}")]
    Internal {
        /// Detailed error message
        message: String,
    },

    /// Generic errors from external dependencies
    #[error("External error: {source}")]
    External {
        /// The underlying error
        #[source]
        source: anyhow::Error,
    },
}

impl DocchatError {
    /// Create a new retrieval error with a message.
    pub fn retrieval<S: Into<String>>(message: S) -> Self {
        Self::Retrieval {
            message: message.into(),
        }
    }

    /// Create a new LLM error with a message.
    pub fn llm<S: Into<String>>(message: S) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Create a new tool error.
    pub fn tool<S1: Into<String>, S2: Into<String>>(tool_name: S1, message: S2) -> Self {
        Self::Tool {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error with a message.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new validation error with a message.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not found error with a resource name.
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a new internal error with a message.
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a new external error from any error that implements `Into<anyhow::Error>`.
    pub fn external<E: Into<anyhow::Error>>(error: E) -> Self {
        Self::External {
            source: error.into(),
        }
    }

    /// Get the error category for structured logging.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Retrieval { .. } => "retrieval",
            Self::Llm { .. } => "llm",
            Self::Tool { .. } => "tool",
            Self::Configuration { .. } => "configuration",
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Internal { .. } => "internal",
            Self::External { .. } => "external",
        }
    }
}

/// Convert from `anyhow::Error` to `DocchatError`.
impl From<anyhow::Error> for DocchatError {
    fn from(error: anyhow::Error) -> Self {
        Self::External { source: error }
    }
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, DocchatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DocchatError::retrieval("index unavailable");
        assert!(matches!(err, DocchatError::Retrieval { .. }));
        assert_eq!(err.to_string(), "Retrieval error: index unavailable");
    }

    #[test]
    fn test_tool_error_display() {
        let err = DocchatError::tool("query_document", "missing query");
        let display = err.to_string();
        assert!(display.contains("query_document"));
        assert!(display.contains("missing query"));
        assert_eq!(err.category(), "tool");
    }
}
