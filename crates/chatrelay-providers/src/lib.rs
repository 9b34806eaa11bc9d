//! Upstream provider layer for Chatrelay.
//!
//! # Architecture
//!
//! - [`traits::ChatProvider`] / [`traits::ImageProvider`] — what the proxy calls
//! - [`error::ProviderError`] — the one failure taxonomy every adapter maps onto
//! - [`registry`] — static specs for the supported upstreams
//! - [`models`] — chat model catalog and image model table
//! - [`http_provider::HttpProvider`] — OpenAI-compatible chat client (OpenRouter, Groq)
//! - [`replicate::ReplicateProvider`] — Replicate predictions (chat + images)
//! - [`transcription::GroqTranscriber`] — Whisper speech-to-text
//! - [`set::ProviderSet`] — backend → adapter dispatch

pub mod error;
pub mod http_provider;
pub mod models;
pub mod registry;
pub mod replicate;
pub mod set;
pub mod traits;
pub mod transcription;

// Re-export main types for convenience
pub use error::ProviderError;
pub use http_provider::{Attribution, HttpProvider};
pub use models::{find_image_model, ImageModel, ModelDescriptor, ModelFamily, ModelRegistry, RegistryError};
pub use registry::{Backend, ProviderConfig, ProviderSpec, PROVIDERS};
pub use replicate::ReplicateProvider;
pub use set::ProviderSet;
pub use traits::{ChatProvider, ImageProvider, NO_RESPONSE};
pub use transcription::{AudioClip, GroqTranscriber, TranscriptionProvider};
