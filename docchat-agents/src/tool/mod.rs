//! Tools the agent can invoke.

pub mod query_document;

pub use query_document::{QUERY_DOCUMENT_TOOL, QueryDocumentTool};

use crate::{error::Result, parts::SourceNode, types::ToolSchema};
use async_trait::async_trait;
use docchat_core::ToolDefinition;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Result of a successful tool execution
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    /// Nodes the tool drew on, shown to the user as sources
    pub source_nodes: Vec<SourceNode>,
    /// Text handed back to the language model
    pub response_text: String,
}

/// Core trait for agent tools
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    /// Schema advertised to the language model
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with model-provided input
    async fn execute(&self, input: &serde_json::Value) -> Result<ToolOutput>;

    /// Tool name
    fn name(&self) -> String {
        self.schema().name
    }

    /// Definition passed to the language model
    fn definition(&self) -> ToolDefinition {
        self.schema().into()
    }
}
