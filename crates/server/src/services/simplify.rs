use log::debug;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{check_status, ServiceError, Simplifier};

/// Builds the instruction sent to the language model for `text`.
pub fn simplification_prompt(text: &str) -> String {
    format!(
        "Rewrite the following NCERT textbook content in simplified language.\n\n\
         Guidelines:\n\
         - Keep the explanation accurate to the original meaning.\n\
         - Use simple words and short sentences.\n\
         - Explain ideas clearly and step by step.\n\
         - Use everyday examples only where helpful.\n\
         - Do NOT add greetings, questions, or conversational phrases.\n\
         - Do NOT address the reader directly.\n\
         - Do NOT add motivational or emotional language.\n\
         - Write in a neutral, textbook-style explanatory tone.\n\n\
         Original text:\n{text}\n\n\
         Simplified explanation:"
    )
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Simplifier backed by an OpenAI-compatible `chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsSimplifier {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionsSimplifier {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
        }
    }
}

impl Simplifier for ChatCompletionsSimplifier {
    fn simplify(&self, text: &str) -> Result<String, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::NotConfigured("LLM API key"))?;

        let prompt = simplification_prompt(text);
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!("requesting simplification from {} ({})", url, self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()?;
        let body: ChatResponse = check_status(response)?.json()?;

        first_choice(body)
    }
}

fn first_choice(body: ChatResponse) -> Result<String, ServiceError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ServiceError::UnexpectedResponse("completion has no content".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_wraps_the_source_text() {
        let prompt = simplification_prompt("Force equals mass times acceleration.");
        assert!(prompt.starts_with("Rewrite the following NCERT textbook content"));
        assert!(prompt.contains("Original text:\nForce equals mass times acceleration.\n\n"));
        assert!(prompt.ends_with("Simplified explanation:"));
    }

    #[test]
    fn reads_the_first_choice() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Push makes it move."}}]}"#,
        )
        .expect("parse completion");
        assert_eq!(first_choice(body).expect("content"), "Push makes it move.");
    }

    #[test]
    fn empty_completion_is_unexpected() {
        let body: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).expect("parse");
        assert!(matches!(
            first_choice(body),
            Err(ServiceError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn missing_key_is_reported_before_any_request() {
        let simplifier = ChatCompletionsSimplifier::new(
            Client::new(),
            "http://127.0.0.1:9/v1/",
            Some("  ".to_owned()),
            "test-model",
        );
        let err = simplifier.simplify("text").unwrap_err();
        assert_eq!(err.to_string(), "LLM API key is not configured");
    }
}
