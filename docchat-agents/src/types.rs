//! Shared types for the agent framework.

use docchat_core::ToolDefinition;
use serde::{Deserialize, Serialize};

/// Schema describing a tool to the language model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON schema of the tool input
    pub input_schema: serde_json::Value,
}

impl From<ToolSchema> for ToolDefinition {
    fn from(schema: ToolSchema) -> Self {
        Self {
            name: schema.name,
            description: schema.description,
            parameters: schema.input_schema,
        }
    }
}
