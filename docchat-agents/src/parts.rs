//! UI message parts streamed to the chat client.
//!
//! Text parts follow the AI SDK text-block protocol (`text-start`,
//! `text-delta`, `text-end`). Every other part is a data part whose type
//! starts with `data-`.

use crate::error::Result;
use docchat_core::ScoredNode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Prefix shared by every data part type
pub const DATA_PART_PREFIX: &str = "data-";
/// Data part type carrying tool run status
pub const RUN_STATUS_PART: &str = "data-event";
/// Data part type carrying source attribution
pub const SOURCES_PART: &str = "data-sources";
/// Data part type carrying suggested follow-up questions
pub const SUGGESTED_QUESTIONS_PART: &str = "data-suggested_questions";

/// Directory under which source documents are exposed to the client
pub const SOURCE_FILE_DIR: &str = "data";
/// URL prefix under which source files are served
pub const SOURCE_FILE_URL_PREFIX: &str = "/api/files/data";

/// A text block part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TextPart {
    /// Opens a text block
    TextStart {
        /// Block id
        id: String,
    },
    /// Appends text to an open block
    TextDelta {
        /// Block id
        id: String,
        /// Text fragment
        delta: String,
    },
    /// Closes a text block
    TextEnd {
        /// Block id
        id: String,
    },
}

impl TextPart {
    /// Block id of this part
    pub fn id(&self) -> &str {
        match self {
            Self::TextStart { id } | Self::TextDelta { id, .. } | Self::TextEnd { id } => id,
        }
    }
}

/// A typed data part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPart {
    /// Part type, e.g. `data-event`
    #[serde(rename = "type")]
    pub part_type: String,
    /// Optional id; parts sharing an id update the same UI entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Payload
    pub data: Value,
}

impl DataPart {
    /// Create a data part without an id
    pub fn new(part_type: impl Into<String>, data: Value) -> Self {
        Self {
            part_type: part_type.into(),
            id: None,
            data,
        }
    }

    /// Set the part id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Whether the part type is one the client renders
    pub fn is_ui_data(&self) -> bool {
        self.part_type.starts_with(DATA_PART_PREFIX)
    }
}

/// Any part written to the client stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UiPart {
    /// Text block part
    Text(TextPart),
    /// Data part
    Data(DataPart),
}

/// Status of a tool run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Tool call in progress
    Pending,
    /// Tool call succeeded
    Success,
    /// Tool call failed
    Error,
}

/// Progress report for one tool call.
///
/// All reports for the same call share `id`, so the client updates a single entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatusEvent {
    /// Correlation id, the tool call id
    pub id: String,
    /// Short title
    pub title: String,
    /// Longer description
    pub description: String,
    /// Current status
    pub status: RunStatus,
    /// Optional extra payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Serialize)]
struct RunStatusPayload<'a> {
    title: &'a str,
    description: &'a str,
    status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
}

impl RunStatusEvent {
    /// Create a status report
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        status: RunStatus,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            status,
            data: None,
        }
    }

    /// Attach an extra payload
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Render as a `data-event` part
    pub fn to_part(&self) -> Result<DataPart> {
        let payload = RunStatusPayload {
            title: &self.title,
            description: &self.description,
            status: self.status,
            data: self.data.as_ref(),
        };
        Ok(DataPart::new(RUN_STATUS_PART, serde_json::to_value(payload)?).with_id(self.id.clone()))
    }
}

/// A retrieved chunk as presented to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceNode {
    /// Node id
    pub id: String,
    /// Source file name
    pub file_name: String,
    /// Path of the source file relative to the server root
    pub file_path: String,
    /// URL under which the file is served
    pub url: String,
    /// Node metadata
    pub metadata: HashMap<String, Value>,
    /// Retrieval score, `null` when the retriever gives none
    #[serde(default)]
    pub score: Option<f32>,
    /// Chunk text
    pub text: String,
}

impl From<&ScoredNode> for SourceNode {
    fn from(scored: &ScoredNode) -> Self {
        let file_name = scored.node.file_name().unwrap_or_else(|| {
            warn!(node_id = %scored.id(), "Source node has no file_name metadata");
            String::new()
        });
        Self {
            id: scored.id().to_string(),
            file_path: format!("{SOURCE_FILE_DIR}/{file_name}"),
            url: format!("{SOURCE_FILE_URL_PREFIX}/{file_name}"),
            file_name,
            metadata: scored.node.metadata.clone(),
            score: scored.score,
            text: scored.content().to_string(),
        }
    }
}

/// Source attribution for one tool call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceEvent {
    /// Retrieved nodes
    pub nodes: Vec<SourceNode>,
}

impl SourceEvent {
    /// Render as a `data-sources` part
    pub fn to_part(&self) -> Result<DataPart> {
        Ok(DataPart::new(SOURCES_PART, serde_json::to_value(self)?))
    }
}
