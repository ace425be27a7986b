//! Document retrieval tool.
//!
//! Wraps a [`Retriever`] so the language model can look up passages from the
//! indexed documents. The response text lists each hit with its source file so
//! the model can ground its answer.

use crate::{
    error::{AgentError, Result},
    parts::SourceNode,
    tool::{Tool, ToolOutput},
    types::ToolSchema,
};
use async_trait::async_trait;
use docchat_core::{Query, Retriever, ScoredNode, types::DEFAULT_TOP_K};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Registered name of the retrieval tool
pub const QUERY_DOCUMENT_TOOL: &str = "query_document";

const DEFAULT_DESCRIPTION: &str = "Search the indexed documents and return the passages most \
relevant to the query. Use it whenever the question concerns the content of the documents.";

#[derive(Debug, Deserialize)]
struct QueryDocumentInput {
    query: String,
}

/// Tool that queries the document index
#[derive(Debug, Clone)]
pub struct QueryDocumentTool {
    retriever: Arc<dyn Retriever>,
    description: String,
    top_k: usize,
}

impl QueryDocumentTool {
    /// Create the tool over a retriever
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self {
            retriever,
            description: DEFAULT_DESCRIPTION.to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Override the description shown to the model
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the number of passages returned per query
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    fn format_response(nodes: &[ScoredNode]) -> String {
        if nodes.is_empty() {
            return "No relevant documents were found for this query.".to_string();
        }

        nodes
            .iter()
            .enumerate()
            .map(|(i, scored)| {
                let file = scored.node.file_name().unwrap_or_else(|| "unknown".to_string());
                let header = match scored.score {
                    Some(score) => format!("Source {} ({file}, score {score:.3}):", i + 1),
                    None => format!("Source {} ({file}):", i + 1),
                };
                format!("{header}\n{}", scored.content())
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[async_trait]
impl Tool for QueryDocumentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: QUERY_DOCUMENT_TOOL.to_string(),
            description: self.description.clone(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The question or keywords to look up in the documents"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, input: &serde_json::Value) -> Result<ToolOutput> {
        let input: QueryDocumentInput = serde_json::from_value(input.clone())
            .map_err(|e| AgentError::validation("query", format!("Invalid tool input: {e}")))?;

        let text = input.query.trim();
        if text.is_empty() {
            return Err(AgentError::validation("query", "Query text is required"));
        }

        debug!(query = text, top_k = self.top_k, "Querying documents");
        let query = Query::new(text).with_top_k(self.top_k);
        let nodes = self.retriever.retrieve(&query).await?;
        info!(hits = nodes.len(), retriever = self.retriever.name(), "Document query complete");

        Ok(ToolOutput {
            source_nodes: nodes.iter().map(SourceNode::from).collect(),
            response_text: Self::format_response(&nodes),
        })
    }
}
