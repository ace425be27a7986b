//! Language model clients.

pub mod openai;

pub use openai::OpenAiChatClient;
