//! BM25 keyword retriever.
//!
//! Builds an in-memory BM25 index over the loaded document chunks. The index
//! is immutable once built, so one retriever can serve every concurrent run
//! without locking.

use async_trait::async_trait;
use docchat_core::{DocchatError, Node, Query, Result, Retriever, ScoredNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// BM25 algorithm parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term frequency saturation (typically 1.2)
    pub k1: f32,

    /// Length normalization (typically 0.75)
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Configuration for [`KeywordRetriever`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordConfig {
    /// BM25 parameters
    pub params: Bm25Params,

    /// Minimum token length in characters
    pub min_token_length: usize,

    /// Drop results scoring below this value
    pub score_threshold: Option<f32>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            params: Bm25Params::default(),
            min_token_length: 2,
            score_threshold: None,
        }
    }
}

#[derive(Debug)]
struct DocumentStats {
    length: usize,
    term_frequencies: HashMap<String, usize>,
}

#[derive(Debug, Default)]
struct Bm25Index {
    documents: Vec<DocumentStats>,
    idf: HashMap<String, f32>,
    avg_doc_length: f32,
}

impl Bm25Index {
    fn build(nodes: &[Node], config: &KeywordConfig) -> Self {
        let documents: Vec<DocumentStats> = nodes
            .iter()
            .map(|node| {
                let terms = tokenize(&node.content, config.min_token_length);
                let mut term_frequencies = HashMap::new();
                for term in &terms {
                    *term_frequencies.entry(term.clone()).or_insert(0) += 1;
                }
                DocumentStats {
                    length: terms.len(),
                    term_frequencies,
                }
            })
            .collect();

        let mut doc_counts: HashMap<&str, usize> = HashMap::new();
        for doc in &documents {
            for term in doc.term_frequencies.keys() {
                *doc_counts.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let total = documents.len() as f32;
        // BM25+ style idf keeps terms that occur in every document positive.
        #[allow(clippy::cast_precision_loss)]
        let idf = doc_counts
            .into_iter()
            .map(|(term, count)| {
                let count = count as f32;
                (term.to_string(), ((total - count + 0.5) / (count + 0.5) + 1.0).ln())
            })
            .collect();

        let total_length: usize = documents.iter().map(|doc| doc.length).sum();
        #[allow(clippy::cast_precision_loss)]
        let avg_doc_length = if documents.is_empty() {
            0.0
        } else {
            total_length as f32 / total
        };

        Self {
            documents,
            idf,
            avg_doc_length,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn score(&self, query_terms: &[String], doc: &DocumentStats, params: Bm25Params) -> f32 {
        if self.avg_doc_length == 0.0 {
            return 0.0;
        }
        let length_norm = 1.0 - params.b + params.b * (doc.length as f32 / self.avg_doc_length);
        query_terms
            .iter()
            .filter_map(|term| {
                let tf = *doc.term_frequencies.get(term)? as f32;
                let idf = *self.idf.get(term)?;
                Some(idf * (tf * (params.k1 + 1.0)) / (tf + params.k1 * length_norm))
            })
            .sum()
    }
}

/// Lowercased alphanumeric tokens of at least `min_length` characters
fn tokenize(text: &str, min_length: usize) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= min_length)
        .map(str::to_lowercase)
        .collect()
}

/// Keyword retriever ranking chunks with BM25.
///
/// # Examples
///
/// ```rust
/// use docchat_core::{Node, Query, Retriever};
/// use docchat_integrations::retrievers::KeywordRetriever;
///
/// # async fn example() -> docchat_core::Result<()> {
/// let retriever = KeywordRetriever::from_nodes(vec![
///     Node::new("Letters must be rectangular."),
///     Node::new("Parcels may be any shape."),
/// ]);
/// let hits = retriever.retrieve(&Query::new("rectangular letters")).await?;
/// assert_eq!(hits.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct KeywordRetriever {
    index: Bm25Index,
    nodes: Vec<Node>,
    config: KeywordConfig,
}

impl KeywordRetriever {
    /// Build a retriever with custom configuration
    pub fn new(nodes: Vec<Node>, config: KeywordConfig) -> Self {
        let index = Bm25Index::build(&nodes, &config);
        info!(
            documents = nodes.len(),
            terms = index.idf.len(),
            "Built keyword index"
        );
        Self {
            index,
            nodes,
            config,
        }
    }

    /// Build a retriever with default configuration
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self::new(nodes, KeywordConfig::default())
    }

    /// Number of indexed chunks
    pub fn document_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[async_trait]
impl Retriever for KeywordRetriever {
    #[instrument(skip(self), fields(documents = self.nodes.len()))]
    async fn retrieve(&self, query: &Query) -> Result<Vec<ScoredNode>> {
        let terms = tokenize(&query.text, self.config.min_token_length);
        if terms.is_empty() || self.nodes.is_empty() {
            debug!("Nothing to match");
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .index
            .documents
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, self.index.score(&terms, doc, self.config.params)))
            .filter(|(_, score)| match self.config.score_threshold {
                Some(threshold) => *score >= threshold,
                None => *score > 0.0,
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(query.top_k);

        debug!(hits = scored.len(), "Keyword retrieval complete");
        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredNode::new(self.nodes[i].clone(), score))
            .collect())
    }

    fn name(&self) -> &'static str {
        "KeywordRetriever"
    }

    async fn health_check(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(DocchatError::not_found(
                "Index not found. Add documents to the data directory and restart the server",
            ));
        }
        Ok(())
    }
}
