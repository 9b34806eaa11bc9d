//! Shared, read-only application state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chatrelay_core::config::schema::{ChatConfig, ImagesConfig};
use chatrelay_core::config::Config;
use chatrelay_core::utils::expand_home;
use chatrelay_providers::{
    Attribution, GroqTranscriber, ImageProvider, ModelRegistry, ProviderSet, RegistryError,
    ReplicateProvider, TranscriptionProvider,
};

pub type SharedState = Arc<AppState>;

/// Everything a handler needs. Built once at startup, never mutated.
pub struct AppState {
    pub registry: ModelRegistry,
    pub providers: ProviderSet,
    pub images: Arc<dyn ImageProvider>,
    pub transcriber: Arc<dyn TranscriptionProvider>,
    pub chat: ChatConfig,
    pub images_config: ImagesConfig,
    /// Root of the static site; generated images go under `images/`.
    pub static_dir: PathBuf,
}

impl AppState {
    /// Build the registry and every adapter from config.
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let registry = ModelRegistry::from_config(config)?;
        let providers = ProviderSet::from_config(&config.providers, &attribution(config));

        Ok(Self {
            registry,
            providers,
            images: Arc::new(ReplicateProvider::new(&config.providers.replicate)),
            transcriber: Arc::new(GroqTranscriber::new(
                &config.providers.groq,
                &config.transcription.model,
            )),
            chat: config.chat.clone(),
            images_config: config.images.clone(),
            static_dir: expand_home(&config.server.static_dir),
        })
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(self)
    }

    /// Per-attempt deadline; `None` when disabled.
    pub fn attempt_timeout(&self) -> Option<Duration> {
        match self.chat.attempt_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Attribution headers are sent only when the deployment has a public URL.
fn attribution(config: &Config) -> Attribution {
    match config.server.public_base_url.as_deref() {
        Some(url) if !url.is_empty() => Attribution {
            referer: Some(url.to_string()),
            title: Some(config.server.app_name.clone()),
        },
        _ => Attribution::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let state = AppState::from_config(&Config::default()).unwrap();
        assert_eq!(state.registry.default_model().client_id, "gpt-oss-20b");
        assert_eq!(state.attempt_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(state.static_dir, PathBuf::from("public"));
        assert!(!state.images.is_configured());
    }

    #[test]
    fn test_timeout_disabled() {
        let mut config = Config::default();
        config.chat.attempt_timeout_secs = 0;
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.attempt_timeout(), None);
    }

    #[test]
    fn test_bad_default_model_fails() {
        let mut config = Config::default();
        config.chat.default_model = "no-such-model".into();
        assert!(AppState::from_config(&config).is_err());
    }

    #[test]
    fn test_attribution_requires_public_url() {
        let mut config = Config::default();
        assert!(attribution(&config).referer.is_none());

        config.server.public_base_url = Some("https://chat.example.com".into());
        let attr = attribution(&config);
        assert_eq!(attr.referer.as_deref(), Some("https://chat.example.com"));
        assert_eq!(attr.title.as_deref(), Some("Chatrelay"));
    }
}
