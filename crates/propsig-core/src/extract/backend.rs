//! Chat completion backends for the semantic strategy.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ExtractionUnavailable;
use crate::models::config::SemanticConfig;

/// One chat completion request asking for a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

/// Trait for chat completion services.
///
/// This trait separates the transport from prompt building and response
/// parsing so the semantic strategy can run against any compatible service.
pub trait ChatBackend {
    /// Send the request and return the assistant message content.
    fn complete(&self, request: &ChatRequest) -> Result<String, ExtractionUnavailable>;

    /// Whether a credential is loaded; without one every call fails.
    fn has_credential(&self) -> bool {
        true
    }
}

impl<B: ChatBackend + ?Sized> ChatBackend for &B {
    fn complete(&self, request: &ChatRequest) -> Result<String, ExtractionUnavailable> {
        (**self).complete(request)
    }

    fn has_credential(&self) -> bool {
        (**self).has_credential()
    }
}

/// OpenAI-compatible `/chat/completions` backend.
pub struct OpenAiBackend {
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

impl OpenAiBackend {
    /// Create a backend. A missing key is not an error here; every call
    /// reports [`ExtractionUnavailable::MissingCredential`] instead.
    pub fn new(config: &SemanticConfig, api_key: Option<String>) -> Result<Self, ExtractionUnavailable> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

impl ChatBackend for OpenAiBackend {
    fn complete(&self, request: &ChatRequest) -> Result<String, ExtractionUnavailable> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ExtractionUnavailable::MissingCredential)?;

        let body = json!({
            "model": request.model,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
            "response_format": {"type": "json_object"},
            "max_tokens": request.max_tokens,
        });

        debug!("Calling chat completion model {}", request.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(ExtractionUnavailable::Service(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let response_json: Value = response
            .json()
            .map_err(|e| ExtractionUnavailable::Malformed(e.to_string()))?;

        message_content(&response_json)
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Pull the first choice's message content out of a completion response.
fn message_content(response: &Value) -> Result<String, ExtractionUnavailable> {
    let choice = response["choices"]
        .get(0)
        .ok_or_else(|| ExtractionUnavailable::Malformed("no choices in response".to_string()))?;

    choice["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| ExtractionUnavailable::Malformed("no message content".to_string()))
}
