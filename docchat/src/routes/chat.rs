//! `POST /api/chat`: run the agent and stream its events as SSE frames.

use axum::{
    Json,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use docchat_agents::{agent::StartEvent, stream::into_sse_frames};
use docchat_core::{ChatMessage, MessageRole};
use futures::StreamExt;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::{error::ApiError, state::AppState};

/// Detail returned when the request has no user message to answer.
pub const INVALID_MESSAGES_DETAIL: &str =
    "Messages cannot be empty and last message must be from user";

/// Body of a chat request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, the last entry being the new user message
    #[serde(default)]
    pub messages: Vec<UiMessage>,
}

/// A chat message as sent by the UI.
#[derive(Debug, Clone, Deserialize)]
pub struct UiMessage {
    /// Author role
    pub role: MessageRole,
    /// Content parts
    #[serde(default)]
    pub parts: Vec<UiMessagePart>,
}

/// One content part of a UI message. Only `text` parts carry content.
#[derive(Debug, Clone, Deserialize)]
pub struct UiMessagePart {
    /// Part type, e.g. `text`
    #[serde(rename = "type")]
    pub part_type: String,
    /// Text of a `text` part
    #[serde(default)]
    pub text: Option<String>,
}

impl UiMessage {
    /// Text parts joined with a blank line.
    pub fn content(&self) -> String {
        self.parts
            .iter()
            .filter(|part| part.part_type == "text")
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn to_chat_message(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content())
    }
}

impl ChatRequest {
    /// Split the conversation into the new user input and its history.
    pub fn into_start_event(self) -> Result<StartEvent, ApiError> {
        let Some((last, history)) = self.messages.split_last() else {
            return Err(ApiError::bad_request(INVALID_MESSAGES_DETAIL));
        };
        if last.role != MessageRole::User || last.parts.is_empty() {
            return Err(ApiError::bad_request(INVALID_MESSAGES_DETAIL));
        }

        Ok(StartEvent::new(
            last.content(),
            history.iter().map(UiMessage::to_chat_message).collect(),
        ))
    }
}

/// Handle a chat request.
///
/// Validation and index failures are answered with a JSON error before any
/// run starts. Once streaming, a failing run ends the body early, and a
/// client disconnect drops the body which cancels the run.
#[instrument(skip_all)]
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let start = request.into_start_event()?;
    state.retriever.health_check().await?;

    let cancel = CancellationToken::new();
    let mut run = state.agent.run_with_cancellation(start, cancel.clone());
    let run_id = run.run_id();
    info!(%run_id, "Streaming chat run");

    let guard = cancel.drop_guard();
    let frames = into_sse_frames(run.stream()).map(move |frame| {
        let _cancel_on_drop = &guard;
        frame.inspect_err(|e| error!(%run_id, error = %e, "Chat run failed mid-stream"))
    });

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CONNECTION, "keep-alive"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(frames),
    )
        .into_response())
}
