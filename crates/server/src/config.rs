//! Command line and environment configuration for the study server.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Default request body limit. Data URLs for templates and mindmaps are large.
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Serves PDF exports and study helpers for textbook content.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "HTTP backend for textbook study aids and PDF exports")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "STUDY_SERVER_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Directory holding the Roboto font files used for PDF exports.
    #[arg(long, env = "STUDY_PDF_FONTS_DIR")]
    pub fonts_dir: Option<PathBuf>,

    /// Maximum accepted request body size in bytes.
    #[arg(long, env = "STUDY_SERVER_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Origin allowed to call the API from a browser. Repeat for several origins.
    #[arg(
        long = "allowed-origin",
        env = "STUDY_SERVER_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values = [
            "http://localhost:3000",
            "http://localhost:5173",
            "http://127.0.0.1:3000",
            "http://127.0.0.1:5173",
        ]
    )]
    pub allowed_origins: Vec<String>,

    /// API key for the OpenAI-compatible simplification endpoint.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[arg(
        long,
        env = "BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta/openai"
    )]
    pub llm_base_url: String,

    /// Model used for simplification.
    #[arg(long, env = "MODEL", default_value = "gemini-2.0-flash")]
    pub llm_model: String,

    /// ElevenLabs API key for audio generation.
    #[arg(long, env = "ELEVENLABS_API_KEY", hide_env_values = true)]
    pub elevenlabs_api_key: Option<String>,

    /// ElevenLabs voice used for audio generation.
    #[arg(long, env = "ELEVENLABS_VOICE_ID")]
    pub elevenlabs_voice_id: Option<String>,

    /// Language code used by `/translate` when the request names none.
    #[arg(long, env = "STUDY_SERVER_TRANSLATE_TARGET", default_value = "hi")]
    pub translate_target: String,
}

/// An allowed origin that is not a valid header value.
#[derive(Debug, thiserror::Error)]
#[error("Invalid allowed origin '{0}'")]
pub struct InvalidOrigin(String);

impl Config {
    /// Builds the CORS layer for the configured origins.
    pub fn cors_layer(&self) -> Result<CorsLayer, InvalidOrigin> {
        let origins = self
            .allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin.trim()).map_err(|_| InvalidOrigin(origin.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::OPTIONS,
                Method::PUT,
                Method::DELETE,
            ])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION])
            .allow_credentials(true)
            .expose_headers([CONTENT_DISPOSITION]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_development_setup() {
        let config = Config::try_parse_from(["study-server"]).expect("parse defaults");
        assert_eq!(config.bind, "127.0.0.1:5000".parse::<SocketAddr>().expect("addr"));
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config.allowed_origins.len(), 4);
        assert!(config.cors_layer().is_ok());
    }

    #[test]
    fn origins_can_be_repeated() {
        let config = Config::try_parse_from([
            "study-server",
            "--allowed-origin",
            "https://notes.example.org",
            "--allowed-origin",
            "https://app.example.org",
        ])
        .expect("parse origins");
        assert_eq!(
            config.allowed_origins,
            vec!["https://notes.example.org", "https://app.example.org"]
        );
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let config = Config::try_parse_from(["study-server", "--allowed-origin", "bad\norigin"])
            .expect("parse");
        assert!(config.cors_layer().is_err());
    }
}
