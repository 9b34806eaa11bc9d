//! Shared failure taxonomy for every upstream adapter.
//!
//! Adapters map their upstream's idiosyncratic error encodings (HTTP status,
//! `error.code` fields inside a 200 body, prediction `status` strings) onto
//! these variants. Callers only ever look at the variant.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Credential missing; no request was sent.
    #[error("{provider} API key not configured")]
    MissingApiKey { provider: &'static str },

    /// Upstream refused the request because of load or quota.
    #[error("{provider} rate limited model {model}")]
    RateLimited { provider: &'static str, model: String },

    /// The attempt did not finish in time.
    #[error("{provider} timed out waiting for model {model}")]
    Timeout { provider: &'static str, model: String },

    /// Any other upstream failure. `body` is for server-side logs only and is
    /// deliberately left out of the `Display` output.
    #[error("{provider} request failed: {message}")]
    Upstream {
        provider: &'static str,
        status: Option<u16>,
        message: String,
        body: String,
    },
}

impl ProviderError {
    /// Whether another model may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. } | ProviderError::Timeout { .. }
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }

    pub fn provider(&self) -> &'static str {
        match self {
            ProviderError::MissingApiKey { provider }
            | ProviderError::RateLimited { provider, .. }
            | ProviderError::Timeout { provider, .. }
            | ProviderError::Upstream { provider, .. } => provider,
        }
    }

    pub(crate) fn upstream(
        provider: &'static str,
        status: Option<u16>,
        message: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        ProviderError::Upstream {
            provider,
            status,
            message: message.into(),
            body: body.into(),
        }
    }

    /// Classify a transport-level `reqwest` failure.
    pub(crate) fn from_transport(provider: &'static str, model: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout {
                provider,
                model: model.to_string(),
            }
        } else {
            ProviderError::upstream(provider, None, format!("transport error: {err}"), "")
        }
    }
}

/// An error object embedded in a response body.
///
/// OpenRouter in particular may answer `200 OK` with
/// `{"error": {"code": 429, "message": "..."}}`.
#[derive(Debug, PartialEq)]
pub(crate) struct EmbeddedError {
    pub rate_limited: bool,
    pub message: String,
}

pub(crate) fn embedded_error(body: &Value) -> Option<EmbeddedError> {
    let error = body.get("error").filter(|e| !e.is_null())?;

    let rate_limited = ["code", "status"]
        .iter()
        .filter_map(|key| error.get(*key).or_else(|| body.get(*key)))
        .any(is_429);

    let message = match error {
        Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string(),
    };

    Some(EmbeddedError {
        rate_limited,
        message,
    })
}

/// True when a raw (possibly non-JSON) body wraps a 429 error object.
pub(crate) fn body_is_rate_limited(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| embedded_error(&value))
        .is_some_and(|embedded| embedded.rate_limited)
}

fn is_429(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_u64() == Some(429),
        Value::String(s) => s == "429" || s.eq_ignore_ascii_case("rate_limit_exceeded"),
        _ => false,
    }
}
