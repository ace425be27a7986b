//! Capability traits consumed by the agent workflow.

pub mod llm;
pub mod retriever;

pub use llm::ChatLlm;
pub use retriever::Retriever;
