//! Retrieval query type.

use serde::{Deserialize, Serialize};

/// Default number of results a query asks for.
pub const DEFAULT_TOP_K: usize = 3;

/// A retrieval request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    /// The query text.
    pub text: String,

    /// Maximum number of results to return.
    pub top_k: usize,
}

impl Query {
    /// Create a new query with the default `top_k`.
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set the number of results to return.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}
