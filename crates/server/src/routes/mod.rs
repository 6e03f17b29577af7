//! Request handlers.

pub mod export;
pub mod study;

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use tokio::task;

use crate::error::ApiError;

/// Parses a JSON body regardless of the request's content type.
fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|err| ApiError::bad_request(format!("Invalid JSON body: {err}")))
}

/// Treats a missing or blank string field as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Runs synchronous work on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::internal(format!("Background task failed: {err}")))?
}
