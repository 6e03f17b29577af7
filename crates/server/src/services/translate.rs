use log::debug;
use reqwest::blocking::Client;
use serde_json::Value;

use super::{check_status, ServiceError, Translator};

/// Public Google translate endpoint used by web clients.
pub const DEFAULT_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Translator backed by the public Google translate endpoint with automatic source detection.
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(client: Client) -> Self {
        Self::with_endpoint(client, DEFAULT_TRANSLATE_URL)
    }

    pub fn with_endpoint(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl Translator for GoogleTranslator {
    fn translate(&self, text: &str, target: &str) -> Result<String, ServiceError> {
        debug!("translating {} byte(s) to '{}'", text.len(), target);
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("client", "gtx"), ("sl", "auto"), ("tl", target), ("dt", "t")])
            .form(&[("q", text)])
            .send()?;
        let body: Value = check_status(response)?.json()?;

        joined_segments(&body)
    }
}

/// Concatenates the translated segments of a `translate_a/single` answer.
///
/// The answer is a nested array whose first element lists `[translated, original, ...]` pairs.
fn joined_segments(body: &Value) -> Result<String, ServiceError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ServiceError::UnexpectedResponse("missing translation segments".to_owned()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(ServiceError::UnexpectedResponse(
            "translation was empty".to_owned(),
        ));
    }
    Ok(translated)
}
