//! HTTP error mapping — the one place outcomes become status codes.
//!
//! Every error body is `{ "error": "<safe message>" }`. Upstream payloads and
//! provider error details go to the log, never to the client.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use chatrelay_core::NormalizeError;
use chatrelay_providers::ProviderError;

pub const API_KEY_NOT_CONFIGURED: &str = "API key not configured";
pub const CHAT_FAILED: &str = "Failed to process your request";
pub const RATE_LIMITED: &str =
    "All models are currently rate limited. Please try again in a moment.";
pub const IMAGE_FAILED: &str = "Failed to generate image";
pub const TRANSCRIPTION_FAILED: &str = "Failed to transcribe audio";
pub const NO_AUDIO: &str = "No audio file provided";

/// Seconds suggested in `Retry-After` when every model is rate limited.
pub const RETRY_AFTER_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before any upstream call.
    #[error("{0}")]
    Validation(String),

    #[error("chat completion failed: {0}")]
    Chat(ProviderError),

    #[error("image generation failed: {0}")]
    Image(ProviderError),

    #[error("could not store generated image: {0}")]
    ImageStorage(#[from] std::io::Error),

    #[error("transcription failed: {0}")]
    Transcription(ProviderError),
}

impl From<NormalizeError> for ApiError {
    fn from(err: NormalizeError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(_: MultipartRejection) -> Self {
        ApiError::Validation(NO_AUDIO.to_string())
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(_) => {}
            other => error!(error = %other, "request failed"),
        }

        match self {
            ApiError::Validation(msg) => error_body(StatusCode::BAD_REQUEST, &msg),

            ApiError::Chat(ProviderError::MissingApiKey { .. })
            | ApiError::Image(ProviderError::MissingApiKey { .. })
            | ApiError::Transcription(ProviderError::MissingApiKey { .. }) => {
                error_body(StatusCode::INTERNAL_SERVER_ERROR, API_KEY_NOT_CONFIGURED)
            }

            ApiError::Chat(ProviderError::RateLimited { .. }) => (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, RETRY_AFTER_SECS.to_string())],
                Json(json!({ "error": RATE_LIMITED })),
            )
                .into_response(),

            ApiError::Chat(_) => error_body(StatusCode::INTERNAL_SERVER_ERROR, CHAT_FAILED),

            ApiError::Image(_) | ApiError::ImageStorage(_) => {
                error_body(StatusCode::INTERNAL_SERVER_ERROR, IMAGE_FAILED)
            }

            ApiError::Transcription(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": TRANSCRIPTION_FAILED, "details": err.to_string() })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_is_400() {
        let response = ApiError::from(NormalizeError::MissingMessage).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "message or messages required");
    }

    #[tokio::test]
    async fn test_rate_limited_has_retry_hint() {
        let response = ApiError::Chat(ProviderError::RateLimited {
            provider: "OpenRouter",
            model: "m".into(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "30");
        assert_eq!(body_json(response).await["error"], RATE_LIMITED);
    }

    #[tokio::test]
    async fn test_upstream_body_never_leaks() {
        let response = ApiError::Chat(ProviderError::Upstream {
            provider: "Groq",
            status: Some(502),
            message: "returned 502".into(),
            body: "stack trace here".into(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "error": CHAT_FAILED }));
    }

    #[tokio::test]
    async fn test_timeout_after_exhaustion_is_500() {
        let response = ApiError::Chat(ProviderError::Timeout {
            provider: "Replicate",
            model: "m".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_missing_key_message() {
        let response =
            ApiError::Transcription(ProviderError::MissingApiKey { provider: "Groq" }).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], API_KEY_NOT_CONFIGURED);
    }
}
