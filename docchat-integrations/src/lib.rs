//! Concrete capability backends for docchat.
//!
//! This crate provides the implementations the server wires into the agent:
//! an OpenAI-compatible streaming chat client, a BM25 keyword retriever and a
//! directory loader that turns text files into retrievable nodes.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod llm;
pub mod loaders;
pub mod retrievers;

// Re-export commonly used types
pub use llm::OpenAiChatClient;
pub use loaders::DirectoryLoader;
pub use retrievers::KeywordRetriever;
