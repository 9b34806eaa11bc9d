//! Provider traits — the seams between the proxy and each upstream.
//!
//! `HttpProvider` covers the OpenAI-compatible chat backends (OpenRouter,
//! Groq); `ReplicateProvider` covers Replicate for both chat and images.

use async_trait::async_trait;
use chatrelay_core::types::Message;

use crate::error::ProviderError;
use crate::models::{ImageModel, ModelDescriptor};

/// Returned instead of an error when the upstream answers without content.
pub const NO_RESPONSE: &str = "No response generated";

/// A chat backend.
///
/// Implementations make exactly one upstream request per call and never retry;
/// retry and fallback belong to the caller.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send the canonical message list to `model` and return the reply text.
    async fn complete(
        &self,
        messages: &[Message],
        model: &ModelDescriptor,
    ) -> Result<String, ProviderError>;

    /// Whether a credential is present.
    fn is_configured(&self) -> bool;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

/// An image generation backend. Returns the raw image bytes.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_image(
        &self,
        model: &ImageModel,
        prompt: &str,
    ) -> Result<Vec<u8>, ProviderError>;

    fn is_configured(&self) -> bool;
}
