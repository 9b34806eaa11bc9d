//! Replicate adapter — chat and image generation over the predictions API.
//!
//! Predictions are created with `Prefer: wait`, so Replicate holds the
//! connection open until the model finishes (or its own wait window ends).
//! Language models return `output` as an array of token strings; image models
//! return one or more file URLs.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};

use chatrelay_core::types::{Message, Role};

use crate::error::{body_is_rate_limited, ProviderError};
use crate::models::{ImageModel, ModelDescriptor};
use crate::registry::{resolve_api_base, Backend, ProviderConfig};
use crate::traits::{ChatProvider, ImageProvider, NO_RESPONSE};

const PROVIDER: &str = "Replicate";

/// Subset of a Replicate prediction object.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Prediction {
    id: String,
    status: String,
    output: Value,
    error: Value,
}

pub struct ReplicateProvider {
    client: reqwest::Client,
    api_base: String,
    api_token: String,
}

impl std::fmt::Debug for ReplicateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateProvider")
            .field("api_base", &self.api_base)
            .field("configured", &!self.api_token.is_empty())
            .finish()
    }
}

impl ReplicateProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_base: resolve_api_base(config, Backend::Replicate.spec()),
            api_token: config.api_key.clone(),
        }
    }

    fn has_token(&self) -> bool {
        !self.api_token.is_empty()
    }

    /// Create a prediction and wait for it. Returns the `output` value.
    ///
    /// `owner/name` targets the model's latest version; `owner/name:version`
    /// pins a version through the generic endpoint.
    async fn run_prediction(
        &self,
        model_ref: &str,
        input: Map<String, Value>,
    ) -> Result<Value, ProviderError> {
        if !self.has_token() {
            error!(provider = PROVIDER, env_key = "REPLICATE_API_TOKEN", "API token not configured");
            return Err(ProviderError::MissingApiKey { provider: PROVIDER });
        }

        let (url, body) = match model_ref.split_once(':') {
            Some((_, version)) => (
                format!("{}/predictions", self.api_base),
                json!({ "version": version, "input": input }),
            ),
            None => (
                format!("{}/models/{}/predictions", self.api_base, model_ref),
                json!({ "input": input }),
            ),
        };

        debug!(provider = PROVIDER, model = model_ref, "Creating prediction");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "HTTP request failed");
                ProviderError::from_transport(PROVIDER, model_ref, e)
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(PROVIDER, model_ref, e))?;

        if status == StatusCode::TOO_MANY_REQUESTS
            || (!status.is_success() && body_is_rate_limited(&text))
        {
            warn!(provider = PROVIDER, model = model_ref, body = %text, "rate limited");
            return Err(ProviderError::RateLimited {
                provider: PROVIDER,
                model: model_ref.to_string(),
            });
        }
        if !status.is_success() {
            error!(provider = PROVIDER, status = %status, body = %text, "API error");
            return Err(ProviderError::upstream(
                PROVIDER,
                Some(status.as_u16()),
                format!("returned {status}"),
                text,
            ));
        }

        let prediction: Prediction = serde_json::from_str(&text).map_err(|e| {
            error!(provider = PROVIDER, error = %e, body = %text, "Failed to parse prediction");
            ProviderError::upstream(PROVIDER, Some(status.as_u16()), "malformed response body", &text)
        })?;

        match prediction.status.as_str() {
            "succeeded" => Ok(prediction.output),
            "failed" | "canceled" => {
                error!(
                    provider = PROVIDER,
                    prediction = %prediction.id,
                    status = %prediction.status,
                    error = %prediction.error,
                    "prediction did not succeed"
                );
                Err(ProviderError::upstream(
                    PROVIDER,
                    Some(status.as_u16()),
                    format!("prediction {}", prediction.status),
                    text,
                ))
            }
            other => {
                warn!(
                    provider = PROVIDER,
                    prediction = %prediction.id,
                    status = other,
                    "prediction still running after synchronous wait"
                );
                Err(ProviderError::Timeout {
                    provider: PROVIDER,
                    model: model_ref.to_string(),
                })
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(PROVIDER, url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(provider = PROVIDER, status = %status, url, "image download failed");
            return Err(ProviderError::upstream(
                PROVIDER,
                Some(status.as_u16()),
                format!("image download returned {status}"),
                body,
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::from_transport(PROVIDER, url, e))?;
        Ok(bytes.to_vec())
    }
}

// ─────────────────────────────────────────────
// Prompt shaping
// ─────────────────────────────────────────────

/// Build the prediction `input` for a chat model.
///
/// The system turn goes to `system_prompt`. A lone user turn is sent as-is;
/// a longer conversation is flattened into a `User:`/`Assistant:` transcript
/// ending with an open `Assistant:` line.
fn chat_input(messages: &[Message], model: &ModelDescriptor) -> Map<String, Value> {
    let mut input = model.params.clone();

    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role() == Role::System)
        .map(Message::content)
        .collect();
    if !system.is_empty() {
        input.insert("system_prompt".into(), Value::String(system.join("\n\n")));
    }

    let turns: Vec<&Message> = messages.iter().filter(|m| m.role() != Role::System).collect();
    let prompt = match turns.as_slice() {
        [only] => only.content().to_string(),
        _ => {
            let mut transcript = String::new();
            for turn in &turns {
                let speaker = match turn.role() {
                    Role::Assistant => "Assistant",
                    _ => "User",
                };
                transcript.push_str(speaker);
                transcript.push_str(": ");
                transcript.push_str(turn.content());
                transcript.push('\n');
            }
            transcript.push_str("Assistant:");
            transcript
        }
    };
    input.insert("prompt".into(), Value::String(prompt));

    if let Some(ref template) = model.prompt_template {
        input.insert("prompt_template".into(), Value::String(template.clone()));
    }

    input
}

/// Join token-stream output into text.
fn output_text(output: &Value) -> String {
    match output {
        Value::String(s) => s.clone(),
        Value::Array(tokens) => tokens.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

/// First file URL in an image model's output.
fn output_url(output: &Value) -> Option<&str> {
    match output {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.first().and_then(Value::as_str),
        _ => None,
    }
}

#[async_trait]
impl ChatProvider for ReplicateProvider {
    async fn complete(
        &self,
        messages: &[Message],
        model: &ModelDescriptor,
    ) -> Result<String, ProviderError> {
        let output = self
            .run_prediction(&model.upstream_model_id, chat_input(messages, model))
            .await?;

        let text = output_text(&output);
        if text.is_empty() {
            return Ok(NO_RESPONSE.to_string());
        }
        debug!(provider = PROVIDER, model = %model.upstream_model_id, chars = text.len(), "LLM response received");
        Ok(text)
    }

    fn is_configured(&self) -> bool {
        self.has_token()
    }

    fn display_name(&self) -> &str {
        PROVIDER
    }
}

#[async_trait]
impl ImageProvider for ReplicateProvider {
    async fn generate_image(
        &self,
        model: &ImageModel,
        prompt: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        let mut input = Map::new();
        input.insert("prompt".into(), Value::String(prompt.to_string()));

        let output = self.run_prediction(model.upstream_model_id, input).await?;
        let url = output_url(&output).ok_or_else(|| {
            error!(provider = PROVIDER, model = model.client_id, output = %output, "no image URL in output");
            ProviderError::upstream(PROVIDER, None, "prediction returned no image", output.to_string())
        })?;

        debug!(provider = PROVIDER, model = model.client_id, url, "Downloading image");
        self.download(url).await
    }

    fn is_configured(&self) -> bool {
        self.has_token()
    }
}
