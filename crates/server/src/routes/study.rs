//! Study helper endpoints backed by external collaborators.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{non_empty, parse_json, run_blocking};
use crate::error::ApiError;
use crate::AppState;

const DEFAULT_AUDIO_LANGUAGE: &str = "english";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TextRequest {
    pub text: Option<String>,
    pub target: Option<String>,
    pub language: Option<String>,
}

impl TextRequest {
    /// Only a missing or empty `text` is rejected; whitespace is passed on as given.
    fn require_text(&mut self) -> Result<String, ApiError> {
        self.text
            .take()
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ApiError::bad_request("No text provided"))
    }
}

/// The `{status: "success", message, data}` envelope.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
}

impl<T> Success<T> {
    pub fn new(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "success",
            message: message.into(),
            data,
        })
    }
}

/// `POST /simplify_text`
pub async fn simplify_text(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Success<String>>, ApiError> {
    let mut request: TextRequest = parse_json(&body)?;
    let text = request.require_text()?;

    let simplifier = Arc::clone(&state.simplifier);
    let simplified = run_blocking(move || Ok(simplifier.simplify(&text)?)).await?;

    info!("simplified text ({} byte(s))", simplified.len());
    Ok(Success::new(simplified, "Success"))
}

/// `POST /translate`
pub async fn translate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Success<Value>>, ApiError> {
    let mut request: TextRequest = parse_json(&body)?;
    let text = request.require_text()?;
    let target = non_empty(request.target).unwrap_or_else(|| state.translate_target.clone());

    let translator = Arc::clone(&state.translator);
    let translated = run_blocking(move || Ok(translator.translate(&text, &target)?)).await?;

    info!("translated text ({} byte(s))", translated.len());
    Ok(Success::new(
        json!({ "translated_text": translated }),
        "Translation successful",
    ))
}

/// `POST /generate_audio`: streams back an MP3 attachment.
pub async fn generate_audio(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let mut request: TextRequest = parse_json(&body)?;
    let text = request.require_text()?;
    let language =
        non_empty(request.language).unwrap_or_else(|| DEFAULT_AUDIO_LANGUAGE.to_owned());

    let synthesizer = Arc::clone(&state.synthesizer);
    let audio = run_blocking(move || Ok(synthesizer.synthesize(&text, &language)?)).await?;

    info!("generated audio ({} byte(s))", audio.len());
    Ok((
        [
            (CONTENT_TYPE, "audio/mpeg"),
            (CONTENT_DISPOSITION, "attachment; filename=audio.mp3"),
        ],
        audio,
    )
        .into_response())
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "success", "message": "ok" }))
}
