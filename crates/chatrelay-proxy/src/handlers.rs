//! Route handlers.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use chatrelay_core::utils::truncate_string;
use chatrelay_core::ChatRequest;
use chatrelay_providers::{find_image_model, AudioClip, ModelDescriptor, ProviderError};

use crate::error::{ApiError, NO_AUDIO};
use crate::images::save_image;
use crate::orchestrator;
use crate::state::SharedState;

// ─────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// `POST /api/chat`
pub async fn chat(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let completion = orchestrator::answer(&state, request).await?;

    Ok(Json(ChatResponse {
        response: completion.text,
    }))
}

// ─────────────────────────────────────────────
// Models listing
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ModelsResponse<'a> {
    pub models: &'a [ModelDescriptor],
    pub total: usize,
}

/// `GET /api/chat/models`
pub async fn list_models(State(state): State<SharedState>) -> impl IntoResponse {
    let models = state.registry.all();
    Json(ModelsResponse {
        models,
        total: models.len(),
    })
    .into_response()
}

// ─────────────────────────────────────────────
// Image generation
// ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub message: String,
    pub image: String,
}

/// `POST /api/generate`
pub async fn generate(
    State(state): State<SharedState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;

    let prompt = request
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Prompt is required".to_string()))?;

    let model = find_image_model(request.model.as_deref(), &state.images_config.default_model);
    debug!(model = model.client_id, prompt = %truncate_string(&prompt, 80), "generating image");

    let bytes = state
        .images
        .generate_image(model, &prompt)
        .await
        .map_err(ApiError::Image)?;
    let image = save_image(&state.static_dir, &bytes).await?;

    info!(model = model.client_id, image = %image, "image generated");

    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Json(GenerateResponse {
            message: "Image(s) generated successfully".to_string(),
            image,
        }),
    ))
}

// ─────────────────────────────────────────────
// Speech to text
// ─────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// `POST /api/speech-to-text` — multipart form with an `audio` file field.
pub async fn speech_to_text(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    let mut multipart = multipart?;
    let clip = read_audio_field(&mut multipart)
        .await?
        .ok_or_else(|| ApiError::Validation(NO_AUDIO.to_string()))?;

    if !state.transcriber.is_configured() {
        return Err(ApiError::Transcription(ProviderError::MissingApiKey {
            provider: "Groq",
        }));
    }

    debug!(
        file = %clip.file_name,
        bytes = clip.bytes.len(),
        transcriber = state.transcriber.display_name(),
        "transcribing"
    );

    let text = state
        .transcriber
        .transcribe(clip)
        .await
        .map_err(ApiError::Transcription)?;

    Ok(Json(TranscriptionResponse { text }))
}

async fn read_audio_field(multipart: &mut Multipart) -> Result<Option<AudioClip>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation(NO_AUDIO.to_string()))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("audio.webm").to_string();
        let mime_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::Validation(NO_AUDIO.to_string()))?;

        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(AudioClip {
            file_name,
            mime_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

// ─────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────

/// `GET /api/health` — which upstream credentials are present.
pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    let providers: Map<String, Value> = state
        .providers
        .status()
        .into_iter()
        .map(|(backend, ok)| (backend.as_str().to_string(), Value::Bool(ok)))
        .collect();

    Json(serde_json::json!({
        "status": "ok",
        "providers": providers,
        "models": state.registry.len(),
    }))
}
