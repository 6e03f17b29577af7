//! HTTP surface of the study-aid backend.
//!
//! Exposes the PDF export endpoints built on [`study_pdf`] and thin wrappers around the external
//! simplification, translation and speech collaborators.

pub mod config;
pub mod error;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use study_pdf::Composer;

pub use config::Config;
pub use error::ApiError;

use services::{
    ChatCompletionsSimplifier, ElevenLabsSynthesizer, GoogleTranslator, ServiceError, Simplifier,
    SpeechSynthesizer, Translator,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<Composer>,
    pub simplifier: Arc<dyn Simplifier>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub translate_target: String,
    pub max_body_bytes: usize,
}

impl AppState {
    /// Builds the production state from configuration.
    ///
    /// Creates blocking HTTP clients, so it must run before the async runtime starts.
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        let client = services::http_client()?;

        Ok(Self {
            composer: Arc::new(
                Composer::new()
                    .with_font_dir(config.fonts_dir.clone())
                    .with_bookmarks(true),
            ),
            simplifier: Arc::new(ChatCompletionsSimplifier::new(
                client.clone(),
                config.llm_base_url.clone(),
                config.llm_api_key.clone(),
                config.llm_model.clone(),
            )),
            translator: Arc::new(GoogleTranslator::new(client.clone())),
            synthesizer: Arc::new(ElevenLabsSynthesizer::new(
                client,
                config.elevenlabs_api_key.clone(),
                config.elevenlabs_voice_id.clone(),
            )),
            translate_target: config.translate_target.clone(),
            max_body_bytes: config.max_body_bytes,
        })
    }
}

/// Builds the application router.
pub fn app(state: AppState) -> Router {
    let max_body_bytes = state.max_body_bytes;

    Router::new()
        .route("/export/notes/pdf", post(routes::export::notes_pdf))
        .route("/export/mindmap/pdf", post(routes::export::mindmap_pdf))
        .route(
            "/export/topic/combined/pdf",
            post(routes::export::topic_combined_pdf),
        )
        .route("/export/chapter/pdf", post(routes::export::chapter_pdf))
        .route(
            "/export/chapter/combined/pdf",
            post(routes::export::chapter_combined_pdf),
        )
        .route("/simplify_text", post(routes::study::simplify_text))
        .route("/translate", post(routes::study::translate))
        .route("/generate_audio", post(routes::study::generate_audio))
        .route("/health", get(routes::study::health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
