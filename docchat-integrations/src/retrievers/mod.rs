//! Retriever implementations.

pub mod keyword;

pub use keyword::{Bm25Params, KeywordConfig, KeywordRetriever};
