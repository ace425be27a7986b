//! Retrieval traits for finding relevant nodes.
//!
//! Retrievers are process-wide, read-mostly capabilities shared by every
//! concurrent chat run, so implementations must not keep per-run state.

use async_trait::async_trait;

use crate::{Query, Result, ScoredNode};

/// Retrieves relevant nodes for a query.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use docchat_core::{Query, Result, Retriever, ScoredNode};
///
/// #[derive(Debug)]
/// struct EmptyRetriever;
///
/// #[async_trait]
/// impl Retriever for EmptyRetriever {
///     async fn retrieve(&self, _query: &Query) -> Result<Vec<ScoredNode>> {
///         Ok(vec![])
///     }
/// }
/// ```
#[async_trait]
pub trait Retriever: Send + Sync + std::fmt::Debug {
    /// Retrieve nodes for a query.
    ///
    /// Returns at most `query.top_k` nodes sorted by relevance
    /// (highest score first).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying index cannot be searched.
    async fn retrieve(&self, query: &Query) -> Result<Vec<ScoredNode>>;

    /// Get a human-readable name for this retriever.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Check if the retriever is ready to serve queries.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
