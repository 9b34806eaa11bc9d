//! Provider registry — static specs for the supported upstreams.
//!
//! Each `ProviderSpec` describes how to connect to one upstream: env var for
//! the credential, default API base, and request quirks.

use serde::{Deserialize, Serialize};

/// Re-export the provider config from core — single source of truth.
pub use chatrelay_core::config::schema::ProviderConfig;

// ─────────────────────────────────────────────
// Backend
// ─────────────────────────────────────────────

/// Which upstream serves a model. Selects the adapter.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    OpenRouter,
    Groq,
    Replicate,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::OpenRouter, Backend::Groq, Backend::Replicate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::OpenRouter => "openrouter",
            Backend::Groq => "groq",
            Backend::Replicate => "replicate",
        }
    }

    /// Parse a config-file backend name (case-insensitive).
    pub fn parse(name: &str) -> Option<Backend> {
        Backend::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(name))
    }

    /// The static spec for this backend.
    pub fn spec(&self) -> &'static ProviderSpec {
        match self {
            Backend::OpenRouter => &PROVIDERS[0],
            Backend::Groq => &PROVIDERS[1],
            Backend::Replicate => &PROVIDERS[2],
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one upstream provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name (e.g. `"openrouter"`), matches the config section.
    pub name: &'static str,
    /// Environment variable for the API key. E.g. `"OPENROUTER_API_KEY"`.
    pub env_key: &'static str,
    /// Human-readable name for logs. E.g. `"OpenRouter"`.
    pub display_name: &'static str,
    /// Default API base URL.
    pub default_api_base: &'static str,
    /// Whether the upstream wants `HTTP-Referer` / `X-Title` attribution headers.
    pub sends_attribution: bool,
}

/// Supported upstreams, indexed by [`Backend::spec`].
pub static PROVIDERS: &[ProviderSpec] = &[
    // OpenRouter — OpenAI-compatible gateway to many free models
    ProviderSpec {
        name: "openrouter",
        env_key: "OPENROUTER_API_KEY",
        display_name: "OpenRouter",
        default_api_base: "https://openrouter.ai/api/v1",
        sends_attribution: true,
    },
    // Groq — OpenAI-compatible, also hosts Whisper
    ProviderSpec {
        name: "groq",
        env_key: "GROQ_API_KEY",
        display_name: "Groq",
        default_api_base: "https://api.groq.com/openai/v1",
        sends_attribution: false,
    },
    // Replicate — prediction API, token-stream output
    ProviderSpec {
        name: "replicate",
        env_key: "REPLICATE_API_TOKEN",
        display_name: "Replicate",
        default_api_base: "https://api.replicate.com/v1",
        sends_attribution: false,
    },
];

/// Resolve the API base: config override, else the spec default.
pub fn resolve_api_base(config: &ProviderConfig, spec: &ProviderSpec) -> String {
    config
        .api_base
        .as_deref()
        .filter(|b| !b.is_empty())
        .unwrap_or(spec.default_api_base)
        .trim_end_matches('/')
        .to_string()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
