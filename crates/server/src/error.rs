//! The JSON error envelope returned by every endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;
use study_pdf::{ComposeError, DecodeError, ErrorCategory};
use thiserror::Error;

use crate::services::ServiceError;

/// Errors surfaced to HTTP clients as `{"status": "error", "message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed user input (400).
    #[error("{0}")]
    BadRequest(String),

    /// Failure on our side or in an upstream collaborator (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// A data URL that could not be decoded, prefixed with the field it came from.
    pub fn decode(prefix: &str, err: DecodeError) -> Self {
        Self::BadRequest(format!("{prefix}: {err}"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ComposeError> for ApiError {
    fn from(err: ComposeError) -> Self {
        match err.category() {
            ErrorCategory::Content => Self::BadRequest(err.to_string()),
            ErrorCategory::Layout => {
                error!("PDF composition failed: {err}");
                Self::Internal("Failed to generate PDF".to_owned())
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        error!("collaborator call failed: {err}");
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_errors_map_by_category() {
        let content = ApiError::from(ComposeError::Content("Topics missing".to_owned()));
        assert_eq!(content.status(), StatusCode::BAD_REQUEST);
        assert_eq!(content.to_string(), "Topics missing");

        let layout = ApiError::from(ComposeError::Background(DecodeError::Image(
            "truncated".to_owned(),
        )));
        assert_eq!(layout.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(layout.to_string(), "Failed to generate PDF");
    }

    #[test]
    fn decode_errors_name_their_field() {
        let err = ApiError::decode("Template decode error", DecodeError::MissingBase64Marker);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("Template decode error: "));
    }
}
