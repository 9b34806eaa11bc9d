//! Voice transcription — speech-to-text via Groq's Whisper API.
//!
//! The endpoint is OpenAI-compatible (`/audio/transcriptions`), so any
//! compatible base URL works through `providers.groq.apiBase`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, error, warn};

use crate::error::ProviderError;
use crate::registry::{resolve_api_base, Backend, ProviderConfig};

pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-large-v3-turbo";

const PROVIDER: &str = "Groq";

/// An uploaded audio file, held in memory.
#[derive(Clone, Debug)]
pub struct AudioClip {
    pub file_name: String,
    /// MIME type reported by the client, if any.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

// ─────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────

/// Trait for speech-to-text transcription providers.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Transcribe an audio clip to text.
    async fn transcribe(&self, clip: AudioClip) -> Result<String, ProviderError>;

    fn is_configured(&self) -> bool;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

// ─────────────────────────────────────────────
// Groq Whisper
// ─────────────────────────────────────────────

/// Groq-based transcription using their Whisper API.
pub struct GroqTranscriber {
    api_key: String,
    api_url: String,
    model: String,
    client: reqwest::Client,
}

impl GroqTranscriber {
    pub fn new(config: &ProviderConfig, model: &str) -> Self {
        let api_base = resolve_api_base(config, Backend::Groq.spec());
        let model = if model.is_empty() {
            DEFAULT_TRANSCRIPTION_MODEL
        } else {
            model
        };

        Self {
            api_key: config.api_key.clone(),
            api_url: format!("{api_base}/audio/transcriptions"),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Turn a finished HTTP exchange into transcript text.
    ///
    /// The body is only allowed to be lost on error statuses; a failed read
    /// of a successful response is a transport error, never an empty text.
    fn read_transcript(
        &self,
        status: StatusCode,
        body: Result<String, reqwest::Error>,
    ) -> Result<String, ProviderError> {
        if !status.is_success() {
            let body = body.unwrap_or_default();
            error!(
                status = %status,
                body = %body,
                "groq transcription API error"
            );
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(ProviderError::RateLimited {
                    provider: PROVIDER,
                    model: self.model.clone(),
                });
            }
            return Err(ProviderError::upstream(
                PROVIDER,
                Some(status.as_u16()),
                format!("transcription API returned {status}"),
                body,
            ));
        }

        let body = body.map_err(|e| ProviderError::from_transport(PROVIDER, &self.model, e))?;
        let text = body.trim().to_string();
        debug!(chars = text.len(), "transcription complete");
        Ok(text)
    }
}

#[async_trait]
impl TranscriptionProvider for GroqTranscriber {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, ProviderError> {
        if !self.is_configured() {
            warn!("groq transcription: no API key configured");
            return Err(ProviderError::MissingApiKey { provider: PROVIDER });
        }

        debug!(
            file = %clip.file_name,
            bytes = clip.bytes.len(),
            model = %self.model,
            "transcribing audio via Groq"
        );

        let mime = clip
            .mime_type
            .clone()
            .unwrap_or_else(|| audio_mime_type(&clip.file_name).to_string());

        let file_part = reqwest::multipart::Part::bytes(clip.bytes)
            .file_name(clip.file_name)
            .mime_str(&mime)
            .map_err(|e| ProviderError::upstream(PROVIDER, None, format!("invalid mime type: {e}"), ""))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "text");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .timeout(Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(PROVIDER, &self.model, e))?;

        let status = response.status();
        let body = response.text().await;
        self.read_transcript(status, body)
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn display_name(&self) -> &str {
        "Groq Whisper"
    }
}

// ─────────────────────────────────────────────
// Helper
// ─────────────────────────────────────────────

/// Guess an audio MIME type from a file name.
pub fn audio_mime_type(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    let ext = lower.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    match ext {
        "webm" => "audio/webm",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        _ => "application/octet-stream",
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
