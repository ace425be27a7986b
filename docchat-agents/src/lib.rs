//! Agent workflow for docchat.
//!
//! This crate provides the event-driven workflow engine, the retrieval chat
//! agent built on it, the `query_document` tool, follow-up question
//! suggestions and the transformer that turns agent events into SSE frames.
//!
//! # Example
//!
//! ```rust,no_run
//! use docchat_agents::prelude::*;
//! use futures::StreamExt;
//! # use std::sync::Arc;
//! # async fn demo(llm: Arc<dyn docchat_core::ChatLlm>, retriever: Arc<dyn docchat_core::Retriever>) -> docchat_agents::Result<()> {
//! let agent = ChatAgent::builder(llm)
//!     .tool(Arc::new(QueryDocumentTool::new(retriever)))
//!     .build()?;
//!
//! let mut run = agent.run(StartEvent::new("What are the letter standards?", Vec::new()));
//! let mut frames = Box::pin(into_sse_frames(run.stream()));
//! while let Some(frame) = frames.next().await {
//!     print!("{}", frame?);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod error;
pub mod parts;
pub mod stream;
pub mod suggestion;
pub mod tool;
pub mod types;
pub mod workflow;

pub use error::{AgentError, Result};

/// Commonly used items
pub mod prelude {
    pub use crate::agent::{AgentConfig, AgentEvent, ChatAgent, StartEvent};
    pub use crate::error::{AgentError, Result};
    pub use crate::parts::{DataPart, TextPart, UiPart};
    pub use crate::stream::{encode_frame, into_sse_frames, to_ui_part};
    pub use crate::tool::{QueryDocumentTool, Tool, ToolOutput};
    pub use crate::workflow::{EventStream, Workflow, WorkflowEvent, WorkflowRun};
}
