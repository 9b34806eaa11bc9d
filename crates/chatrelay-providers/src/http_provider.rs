//! Chat adapter for OpenAI-compatible `/chat/completions` APIs.
//!
//! Covers OpenRouter and Groq. Both speak the same wire format; OpenRouter
//! additionally takes attribution headers and sometimes reports failures as an
//! `error` object inside a `200 OK` body.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use tracing::{debug, error, warn};

use chatrelay_core::types::{ChatCompletionRequest, ChatCompletionResponse, Message};

use crate::error::{body_is_rate_limited, embedded_error, ProviderError};
use crate::models::ModelDescriptor;
use crate::registry::{resolve_api_base, ProviderConfig, ProviderSpec};
use crate::traits::{ChatProvider, NO_RESPONSE};

/// Who is calling, for upstreams that rank or rate-limit by app.
#[derive(Clone, Debug, Default)]
pub struct Attribution {
    /// Sent as `HTTP-Referer`.
    pub referer: Option<String>,
    /// Sent as `X-Title`.
    pub title: Option<String>,
}

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// A chat provider that talks to an OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://openrouter.ai/api/v1"`).
    api_base: String,
    /// API key for Bearer authentication. Empty = not configured.
    api_key: String,
    /// Extra headers to send with each request (attribution, config extras).
    extra_headers: HeaderMap,
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("provider", &self.spec.display_name)
            .field("configured", &!self.api_key.is_empty())
            .finish()
    }
}

impl HttpProvider {
    /// Create a new HttpProvider from a provider config and spec.
    ///
    /// Attribution headers are only attached when the spec asks for them.
    pub fn new(
        config: &ProviderConfig,
        spec: &'static ProviderSpec,
        attribution: &Attribution,
    ) -> Self {
        let api_base = resolve_api_base(config, spec);

        let mut extra_headers = HeaderMap::new();
        if spec.sends_attribution {
            if let Some(ref referer) = attribution.referer {
                insert_header(&mut extra_headers, "HTTP-Referer", referer);
            }
            if let Some(ref title) = attribution.title {
                insert_header(&mut extra_headers, "X-Title", title);
            }
        }
        if let Some(ref headers) = config.extra_headers {
            for (key, value) in headers {
                insert_header(&mut extra_headers, key, value);
            }
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        HttpProvider {
            client,
            api_base,
            api_key: config.api_key.clone(),
            extra_headers,
            spec,
        }
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn parse_success(&self, model: &str, body: &str) -> Result<String, ProviderError> {
        let provider = self.spec.display_name;

        let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
            error!(provider, model, error = %e, body, "Failed to parse LLM response");
            ProviderError::upstream(provider, Some(200), "malformed response body", body)
        })?;

        if let Some(embedded) = embedded_error(&value) {
            if embedded.rate_limited {
                warn!(provider, model, message = %embedded.message, "rate limited (in body)");
                return Err(ProviderError::RateLimited {
                    provider,
                    model: model.to_string(),
                });
            }
            error!(provider, model, message = %embedded.message, "API error (in body)");
            return Err(ProviderError::upstream(
                provider,
                Some(200),
                "error object in response",
                body,
            ));
        }

        let parsed: ChatCompletionResponse = serde_json::from_value(value).map_err(|e| {
            error!(provider, model, error = %e, body, "Unexpected LLM response shape");
            ProviderError::upstream(provider, Some(200), "malformed response body", body)
        })?;

        Ok(parsed
            .into_first_content()
            .unwrap_or_else(|| NO_RESPONSE.to_string()))
    }
}

fn insert_header(headers: &mut HeaderMap, key: &str, value: &str) {
    if let (Ok(name), Ok(val)) = (
        HeaderName::from_bytes(key.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        headers.insert(name, val);
    } else {
        warn!("Invalid header: {}={}", key, value);
    }
}

#[async_trait]
impl ChatProvider for HttpProvider {
    async fn complete(
        &self,
        messages: &[Message],
        model: &ModelDescriptor,
    ) -> Result<String, ProviderError> {
        let provider = self.spec.display_name;
        let upstream_model = model.upstream_model_id.as_str();

        if !self.is_configured() {
            error!(provider, env_key = self.spec.env_key, "API key not configured");
            return Err(ProviderError::MissingApiKey { provider });
        }

        debug!(
            provider,
            model = upstream_model,
            messages = messages.len(),
            "Calling LLM"
        );

        let request_body = ChatCompletionRequest {
            model: upstream_model.to_string(),
            messages: messages.to_vec(),
            params: model.params.clone(),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .headers(self.extra_headers.clone())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider, error = %e, "HTTP request failed");
                ProviderError::from_transport(provider, upstream_model, e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(provider, upstream_model, e))?;

        // Gateways sometimes wrap an upstream 429 in a 5xx.
        if status == StatusCode::TOO_MANY_REQUESTS
            || (!status.is_success() && body_is_rate_limited(&body))
        {
            warn!(provider, model = upstream_model, status = %status, body = %body, "rate limited");
            return Err(ProviderError::RateLimited {
                provider,
                model: upstream_model.to_string(),
            });
        }

        if !status.is_success() {
            error!(provider, status = %status, body = %body, "API error");
            return Err(ProviderError::upstream(
                provider,
                Some(status.as_u16()),
                format!("returned {status}"),
                body,
            ));
        }

        let text = self.parse_success(upstream_model, &body)?;
        debug!(provider, model = upstream_model, chars = text.len(), "LLM response received");
        Ok(text)
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
