//! Configuration types for docchat.
//!
//! Configuration is read from environment variables (optionally seeded from a
//! `.env` file by the binary) and validated before the server starts.

pub mod app;
pub mod llm;

// Re-export all config types for convenience
pub use app::*;
pub use llm::*;
