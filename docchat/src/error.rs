//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docchat_agents::AgentError;
use docchat_core::DocchatError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Failure returned by a route before streaming starts.
///
/// Rendered as `{"detail": <message>}` with the matching status code.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request was malformed
    #[error("{0}")]
    BadRequest(String),

    /// The requested file does not exist
    #[error("{0}")]
    NotFound(String),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Create a 400 error.
    pub fn bad_request<S: Into<String>>(detail: S) -> Self {
        Self::BadRequest(detail.into())
    }

    /// Create a 404 error.
    pub fn not_found<S: Into<String>>(detail: S) -> Self {
        Self::NotFound(detail.into())
    }

    /// Create a 500 error.
    pub fn internal<S: Into<String>>(detail: S) -> Self {
        Self::Internal(detail.into())
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DocchatError> for ApiError {
    fn from(err: DocchatError) -> Self {
        match err {
            DocchatError::Validation { message } => Self::BadRequest(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Core(core) => core.into(),
            AgentError::Validation { message, .. } => Self::BadRequest(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, detail = %self, "Request failed");
        } else {
            warn!(status = %status, detail = %self, "Request rejected");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(DocchatError::validation("bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DocchatError::not_found("Index not found")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(AgentError::Core(DocchatError::llm("down"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
