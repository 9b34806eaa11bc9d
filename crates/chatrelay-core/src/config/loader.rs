//! Config loader — reads `~/.chatrelay/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.chatrelay/config.json`
//! 3. Provider credentials from their conventional env vars
//!    (`OPENROUTER_API_KEY`, `GROQ_API_KEY`, `REPLICATE_API_TOKEN`, `PUBLIC_BASE_URL`)
//! 4. Environment variables `CHATRELAY_<SECTION>__<FIELD>` (override everything)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    apply_env_overrides(read_config_file(path))
}

fn read_config_file(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    // Ensure parent directory exists
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Supported overrides:
/// - `OPENROUTER_API_KEY`, `GROQ_API_KEY`, `REPLICATE_API_TOKEN` → provider keys
/// - `PUBLIC_BASE_URL` → `server.public_base_url`
/// - `CHATRELAY_PROVIDERS__<NAME>__API_KEY` / `__API_BASE` → `providers.<name>`
/// - `CHATRELAY_SERVER__HOST`, `CHATRELAY_SERVER__PORT`, `CHATRELAY_SERVER__STATIC_DIR`
/// - `CHATRELAY_CHAT__DEFAULT_MODEL`, `CHATRELAY_CHAT__SYSTEM_PROMPT`
/// - `CHATRELAY_CHAT__FALLBACK_MODELS` (comma separated)
/// - `CHATRELAY_CHAT__ATTEMPT_TIMEOUT_SECS`, `CHATRELAY_CHAT__MAX_HISTORY_TURNS`
fn apply_env_overrides(mut config: Config) -> Config {
    // Conventional provider variables
    apply_standard_key(&mut config.providers.openrouter, "OPENROUTER_API_KEY");
    apply_standard_key(&mut config.providers.groq, "GROQ_API_KEY");
    apply_standard_key(&mut config.providers.replicate, "REPLICATE_API_TOKEN");
    if let Some(val) = non_empty_env("PUBLIC_BASE_URL") {
        config.server.public_base_url = Some(val);
    }

    // Namespaced provider overrides
    apply_provider_env(&mut config.providers.openrouter, "OPENROUTER");
    apply_provider_env(&mut config.providers.groq, "GROQ");
    apply_provider_env(&mut config.providers.replicate, "REPLICATE");

    // Server
    if let Ok(val) = std::env::var("CHATRELAY_SERVER__HOST") {
        config.server.host = val;
    }
    if let Ok(val) = std::env::var("CHATRELAY_SERVER__PORT") {
        if let Ok(p) = val.parse::<u16>() {
            config.server.port = p;
        }
    }
    if let Ok(val) = std::env::var("CHATRELAY_SERVER__STATIC_DIR") {
        config.server.static_dir = val;
    }

    // Chat
    if let Ok(val) = std::env::var("CHATRELAY_CHAT__DEFAULT_MODEL") {
        config.chat.default_model = val;
    }
    if let Ok(val) = std::env::var("CHATRELAY_CHAT__SYSTEM_PROMPT") {
        config.chat.system_prompt = val;
    }
    if let Ok(val) = std::env::var("CHATRELAY_CHAT__FALLBACK_MODELS") {
        config.chat.fallback_models = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    if let Ok(val) = std::env::var("CHATRELAY_CHAT__ATTEMPT_TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.chat.attempt_timeout_secs = n;
        }
    }
    if let Ok(val) = std::env::var("CHATRELAY_CHAT__MAX_HISTORY_TURNS") {
        if let Ok(n) = val.parse::<usize>() {
            config.chat.max_history_turns = Some(n);
        }
    }

    config
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn apply_standard_key(provider: &mut ProviderConfig, var: &str) {
    if let Some(val) = non_empty_env(var) {
        provider.api_key = val;
    }
}

/// Apply env var overrides for a single provider.
fn apply_provider_env(provider: &mut ProviderConfig, name: &str) {
    if let Ok(val) = std::env::var(format!("CHATRELAY_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Ok(val) = std::env::var(format!("CHATRELAY_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
