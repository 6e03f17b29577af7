use log::debug;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Serialize;

use super::{check_status, ServiceError, SpeechSynthesizer};

/// ElevenLabs API root.
pub const DEFAULT_ELEVENLABS_URL: &str = "https://api.elevenlabs.io";

const MODEL_ID: &str = "eleven_multilingual_v2";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.8,
            similarity_boost: 0.9,
            style: 0.2,
            use_speaker_boost: false,
        }
    }
}

/// Text-to-speech through the ElevenLabs streaming endpoint.
///
/// The multilingual model detects the language from the text, so the requested language is only
/// logged.
#[derive(Debug, Clone)]
pub struct ElevenLabsSynthesizer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    voice_id: Option<String>,
}

impl ElevenLabsSynthesizer {
    pub fn new(client: Client, api_key: Option<String>, voice_id: Option<String>) -> Self {
        Self::with_url(client, DEFAULT_ELEVENLABS_URL, api_key, voice_id)
    }

    pub fn with_url(
        client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        voice_id: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            voice_id: voice_id.filter(|voice| !voice.trim().is_empty()),
        }
    }
}

impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::NotConfigured("ElevenLabs API key"))?;
        let voice_id = self
            .voice_id
            .as_deref()
            .ok_or(ServiceError::NotConfigured("ElevenLabs voice id"))?;

        let url = format!("{}/v1/text-to-speech/{}/stream", self.base_url, voice_id);
        debug!("synthesizing {} byte(s) of {} text", text.len(), language);
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "audio/mpeg")
            .header("xi-api-key", api_key)
            .json(&SpeechRequest {
                text,
                model_id: MODEL_ID,
                voice_settings: VoiceSettings::default(),
            })
            .send()?;

        Ok(check_status(response)?.bytes()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_body_uses_fixed_voice_settings() {
        let body = serde_json::to_value(SpeechRequest {
            text: "Hello",
            model_id: MODEL_ID,
            voice_settings: VoiceSettings::default(),
        })
        .expect("serialize");

        assert_eq!(body["model_id"], json!("eleven_multilingual_v2"));
        assert_eq!(body["voice_settings"]["use_speaker_boost"], json!(false));
        let stability = body["voice_settings"]["stability"].as_f64().expect("number");
        assert!((stability - 0.8).abs() < 1e-6);
    }

    #[test]
    fn voice_id_is_required() {
        let synthesizer =
            ElevenLabsSynthesizer::new(Client::new(), Some("key".to_owned()), None);
        let err = synthesizer.synthesize("Hello", "english").unwrap_err();
        assert_eq!(err.to_string(), "ElevenLabs voice id is not configured");
    }
}
