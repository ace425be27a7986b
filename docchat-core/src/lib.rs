//! # Docchat Core
//!
//! Core traits, types, and configuration for the docchat retrieval-augmented chat server.
//!
//! This crate provides the pieces every other docchat crate builds on:
//!
//! - **Data structures**: chat messages, tool calls, retrieved nodes, queries and
//!   the incremental units produced by a streaming LLM
//! - **Capability traits**: [`Retriever`] for document search and [`ChatLlm`] for
//!   streaming chat completions with tool calling
//! - **Configuration**: environment-driven [`config::AppConfig`] with validation
//! - **Error handling**: [`DocchatError`] and the crate-wide [`Result`] alias
//!
//! ## Quick Start
//!
//! ```rust
//! use docchat_core::prelude::*;
//!
//! let history = vec![
//!     ChatMessage::user("What are the physical standards for letters?"),
//!     ChatMessage::assistant("Letters must be rectangular."),
//! ];
//! assert_eq!(history[0].role, MessageRole::User);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export commonly used types and traits
pub mod prelude;

// Core modules
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key types at crate root for convenience
pub use error::{DocchatError, Result};
pub use types::{
    ChatMessage, LlmStream, LlmStreamUnit, MessageRole, Node, Query, ScoredNode, ToolCall,
    ToolDefinition,
};

// Re-export traits for convenience
pub use traits::*;

/// Version information for the docchat core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the docchat core library.
pub const NAME: &str = env!("CARGO_PKG_NAME");
