//! Generative-language API client.
//!
//! [`GeminiClient`] implements [`TextGenerator`] over the
//! `models/{model}:generateContent` endpoint. The system instruction, the
//! user turn, and the sampling knobs map onto the request body like this:
//!
//! ```json
//! {
//!   "systemInstruction": { "parts": [{ "text": "..." }] },
//!   "contents": [{ "role": "user", "parts": [{ "text": "..." }] }],
//!   "generationConfig": { "temperature": 0.3, "maxOutputTokens": 600 }
//! }
//! ```
//!
//! # Failure policy
//!
//! - Missing API key → [`GenerationError::MissingApiKey`] without a request.
//! - Network error or timeout → [`GenerationError::Transport`].
//! - Non-2xx status → [`GenerationError::Status`].
//! - No text in the first candidate → [`GenerationError::Blocked`] when the
//!   API reports a block or finish reason, otherwise
//!   [`GenerationError::MalformedResponse`].
//!
//! Nothing is retried. Every request is bounded by `generation.timeout_secs`.

use std::time::Duration;

use async_trait::async_trait;
use knowledge_relay_core::{GenerationError, GenerationRequest, TextGenerator};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::GenerationConfig;

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Build a client. `api_key = None` yields a client whose calls all fail
    /// with [`GenerationError::MissingApiKey`].
    pub fn new(config: &GenerationConfig, api_key: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

/// Build the `generateContent` request body.
pub fn request_body(request: &GenerationRequest) -> Value {
    let mut generation_config = json!({
        "temperature": request.options.temperature,
        "maxOutputTokens": request.options.max_output_tokens,
    });
    if let Some(top_p) = request.options.top_p {
        generation_config["topP"] = json!(top_p);
    }
    if let Some(top_k) = request.options.top_k {
        generation_config["topK"] = json!(top_k);
    }

    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }],
        }],
        "generationConfig": generation_config,
    });
    if let Some(system) = &request.system {
        body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    body
}

/// Pull the generated text out of a `generateContent` response.
pub fn parse_response(json: &Value) -> Result<String, GenerationError> {
    if let Some(reason) = json
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(GenerationError::Blocked(reason.to_string()));
    }

    let candidate = json
        .pointer("/candidates/0")
        .ok_or_else(|| GenerationError::MalformedResponse("missing candidates".to_string()))?;

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if !text.is_empty() {
        return Ok(text);
    }

    match candidate.get("finishReason").and_then(Value::as_str) {
        Some(reason) if reason != "STOP" => Err(GenerationError::Blocked(reason.to_string())),
        _ => Err(GenerationError::MalformedResponse(
            "candidate has no text".to_string(),
        )),
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingApiKey)?;

        debug!(model = %self.model, prompt_chars = request.prompt.len(), "calling generateContent");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request_body(request))
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
        parse_response(&json)
    }
}
