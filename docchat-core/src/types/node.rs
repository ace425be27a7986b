//! Retrievable document fragments.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Metadata key holding the source file name of a node.
pub const FILE_NAME_KEY: &str = "file_name";

/// Metadata key holding the source file path of a node.
pub const FILE_PATH_KEY: &str = "file_path";

/// A fragment of a source document that can be retrieved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Unique identifier for this node.
    pub id: Uuid,

    /// The text content of the fragment.
    pub content: String,

    /// Provenance and other metadata (`file_name`, `file_path`, ...).
    pub metadata: HashMap<String, serde_json::Value>,

    /// Position of this fragment within its source file (0-based).
    pub chunk_index: usize,
}

/// A node with an associated relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredNode {
    /// The node that was retrieved.
    pub node: Node,

    /// Relevance score (higher is more relevant), when the retriever provides one.
    pub score: Option<f32>,
}

impl Node {
    /// Create a new node with the given content.
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            metadata: HashMap::new(),
            chunk_index: 0,
        }
    }

    /// Add or update metadata for this node.
    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the chunk index.
    #[must_use]
    pub fn with_chunk_index(mut self, chunk_index: usize) -> Self {
        self.chunk_index = chunk_index;
        self
    }

    /// Get metadata value by key.
    pub fn get_metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Get metadata value as a string.
    pub fn get_metadata_string(&self, key: &str) -> Option<String> {
        self.metadata.get(key)?.as_str().map(String::from)
    }

    /// Source file name, if recorded.
    pub fn file_name(&self) -> Option<String> {
        self.get_metadata_string(FILE_NAME_KEY)
    }

    /// Check if the node content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

impl ScoredNode {
    /// Create a new scored node.
    pub fn new(node: Node, score: f32) -> Self {
        Self {
            node,
            score: Some(score),
        }
    }

    /// Create a scored node without a score.
    pub fn unscored(node: Node) -> Self {
        Self { node, score: None }
    }

    /// Get the node ID.
    pub fn id(&self) -> Uuid {
        self.node.id
    }

    /// Get the node content.
    pub fn content(&self) -> &str {
        &self.node.content
    }
}
