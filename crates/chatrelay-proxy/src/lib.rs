//! Chatrelay HTTP proxy — axum router over the provider layer.
//!
//! - [`plan`] / [`orchestrator`] — ordered model fallback on rate limits
//! - [`handlers`] — `/api/*` endpoints
//! - [`error`] — outcome → status code + safe message
//! - [`state`] — read-only shared state built from config

pub mod error;
pub mod handlers;
pub mod images;
pub mod orchestrator;
pub mod plan;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;
pub use state::{AppState, SharedState};

/// Upload limit for the speech-to-text endpoint (Whisper accepts 25 MB).
const AUDIO_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Build the application router: `/api/*` plus the static site at `/`.
pub fn router(state: SharedState) -> Router {
    let static_service =
        ServeDir::new(&state.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat/models", get(handlers::list_models))
        .route("/api/generate", post(handlers::generate))
        .route(
            "/api/speech-to-text",
            post(handlers::speech_to_text).layer(DefaultBodyLimit::max(AUDIO_BODY_LIMIT)),
        )
        .route("/api/health", get(handlers::health))
        .fallback_service(static_service)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C.
pub async fn serve(state: SharedState, addr: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received Ctrl+C, shutting down");
        })
        .await
        .context("server error")?;
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
