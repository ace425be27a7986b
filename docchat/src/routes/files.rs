//! `GET /api/files/data/{file}`: serve a source document cited by a sources part.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{error::ApiError, state::AppState};

/// Reject names that could escape the data directory.
pub fn validate_file_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(ApiError::bad_request(
            "Invalid file id: path traversal or separators are not allowed",
        ));
    }
    Ok(())
}

fn content_type(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "md" => "text/markdown; charset=utf-8",
        Some(ext) if ext == "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Serve one file from the data directory.
pub async fn data_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    validate_file_name(&name)?;
    let path = state.data_dir.join(&name);
    debug!(path = %path.display(), "Serving data file");

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::not_found(format!("File {name} not found")))?;
    Ok(([(header::CONTENT_TYPE, content_type(&name))], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("guide.md", true; "plain name")]
    #[test_case("../secret", false; "parent")]
    #[test_case("a/b.txt", false; "slash")]
    #[test_case("a\\b.txt", false; "backslash")]
    #[test_case("", false; "empty")]
    fn test_validate_file_name(name: &str, ok: bool) {
        assert_eq!(validate_file_name(name).is_ok(), ok);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("a.MD"), "text/markdown; charset=utf-8");
        assert_eq!(content_type("a.txt"), "text/plain; charset=utf-8");
        assert_eq!(content_type("a"), "application/octet-stream");
    }
}
