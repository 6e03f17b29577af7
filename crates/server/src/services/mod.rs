//! Clients for the external collaborators behind the study endpoints.
//!
//! Each collaborator is a small synchronous trait so handlers can run it on the blocking pool and
//! tests can swap in fakes.

mod audio;
mod simplify;
mod translate;

use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

pub use audio::{ElevenLabsSynthesizer, DEFAULT_ELEVENLABS_URL};
pub use simplify::{simplification_prompt, ChatCompletionsSimplifier};
pub use translate::{GoogleTranslator, DEFAULT_TRANSLATE_URL};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Failures while talking to an external collaborator.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A credential or identifier needed for the call was not configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// The request could not be sent or the response could not be read.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream service answered with a non-success status.
    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The upstream answer did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Rewrites textbook content in simpler language.
pub trait Simplifier: Send + Sync {
    fn simplify(&self, text: &str) -> Result<String, ServiceError>;
}

/// Translates text into a target language code such as `hi`.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, target: &str) -> Result<String, ServiceError>;
}

/// Converts text to MP3 audio.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, ServiceError>;
}

/// Builds the blocking HTTP client shared by the collaborator implementations.
///
/// Must be called outside of an async context.
pub fn http_client() -> Result<Client, ServiceError> {
    Ok(Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .unwrap_or_else(|_| "Unknown error".to_owned());
    Err(ServiceError::Upstream {
        status: status.as_u16(),
        message,
    })
}
