//! Chat agent built on the workflow engine.

pub mod chat_agent;
pub mod events;
mod handlers;
pub mod state;

pub use chat_agent::{AgentConfig, ChatAgent, ChatAgentBuilder};
pub use events::{AgentEvent, AgentEventKind, StartEvent, ToolCallOutcome};
pub use state::{AgentRunState, ToolBatch};
