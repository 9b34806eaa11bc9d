//! Configuration schema.
//!
//! Hierarchy: `Config` → `ServerConfig`, `ProvidersConfig`, `ChatConfig`,
//! `ImagesConfig`, `TranscriptionConfig`, plus an optional model table.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.chatrelay/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    pub chat: ChatConfig,
    pub images: ImagesConfig,
    pub transcription: TranscriptionConfig,
    /// Replaces the built-in model catalog when non-empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<ModelEntry>,
}

// ─────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────

/// HTTP listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public URL of the deployment, sent upstream as attribution
    /// (`HTTP-Referer` on OpenRouter).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
    /// Directory served at `/`; generated images land in `<staticDir>/images`.
    pub static_dir: String,
    /// Application name sent upstream as `X-Title`.
    pub app_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_base_url: None,
            static_dir: "public".to_string(),
            app_name: "Chatrelay".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single upstream provider (API key, base URL, headers).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    #[serde(default)]
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// One `ProviderConfig` per supported upstream.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openrouter: ProviderConfig,
    #[serde(default)]
    pub groq: ProviderConfig,
    #[serde(default)]
    pub replicate: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by name (e.g. `"groq"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "openrouter" => Some(&self.openrouter),
            "groq" => Some(&self.groq),
            "replicate" => Some(&self.replicate),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly, knowledgeable AI assistant. \
Answer clearly and concisely, use Markdown for structure when it helps, \
and say so when you are not sure about something.";

/// Completion proxy behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    /// Model used when the request names none or an unknown one.
    pub default_model: String,
    /// Prepended to every conversation; never exposed to callers.
    pub system_prompt: String,
    /// Tried in order when the requested model is rate-limited.
    pub fallback_models: Vec<String>,
    /// Deadline for a single upstream attempt. `0` disables it.
    pub attempt_timeout_secs: u64,
    /// Forward only the most recent N prior turns. Unset = whole history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_history_turns: Option<usize>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: "gpt-oss-20b".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            fallback_models: vec![
                "gemma-3-27b".to_string(),
                "llama-3.3-70b".to_string(),
                "qwen-2.5-72b".to_string(),
                "gemma-3-12b".to_string(),
            ],
            attempt_timeout_secs: 60,
            max_history_turns: None,
        }
    }
}

// ─────────────────────────────────────────────
// Images / transcription
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagesConfig {
    pub default_model: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            default_model: "flux-schnell".to_string(),
        }
    }
}

/// Voice transcription settings (uses the Groq provider credential).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscriptionConfig {
    pub model: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "whisper-large-v3-turbo".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Model table override
// ─────────────────────────────────────────────

/// A model entry as written in the config file.
///
/// `backend` is one of `openrouter`, `groq`, `replicate`; `family` is free
/// text (`Google`, `Meta`, `OpenAI`, …).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub id: String,
    pub upstream_model: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub family: String,
    pub backend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub params: serde_json::Map<String, serde_json::Value>,
}
