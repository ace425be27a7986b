//! HTTP routes.

pub mod chat;
pub mod files;

pub use chat::{ChatRequest, UiMessage, UiMessagePart, chat};
pub use files::data_file;
