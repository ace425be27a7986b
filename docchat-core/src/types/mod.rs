//! Core data types for docchat.
//!
//! This module contains the data structures shared across the workflow,
//! the capability backends, and the HTTP layer.

pub mod llm;
pub mod message;
pub mod node;
pub mod query;

// Re-export all types for convenience
pub use llm::*;
pub use message::*;
pub use node::*;
pub use query::*;
