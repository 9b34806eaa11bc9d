//! Backend → chat adapter dispatch table.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use chatrelay_core::config::schema::ProvidersConfig;

use crate::http_provider::{Attribution, HttpProvider};
use crate::replicate::ReplicateProvider;
use crate::registry::Backend;
use crate::traits::ChatProvider;

/// One chat adapter per backend, built once at startup.
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: HashMap<Backend, Arc<dyn ChatProvider>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the real adapters from the `providers` config section.
    pub fn from_config(config: &ProvidersConfig, attribution: &Attribution) -> Self {
        let set = Self::new()
            .with(
                Backend::OpenRouter,
                Arc::new(HttpProvider::new(
                    &config.openrouter,
                    Backend::OpenRouter.spec(),
                    attribution,
                )),
            )
            .with(
                Backend::Groq,
                Arc::new(HttpProvider::new(&config.groq, Backend::Groq.spec(), attribution)),
            )
            .with(
                Backend::Replicate,
                Arc::new(ReplicateProvider::new(&config.replicate)),
            );

        for backend in Backend::ALL {
            debug!(backend = %backend, configured = set.is_available(backend), "chat provider ready");
        }
        set
    }

    /// Register (or replace) the adapter for a backend.
    pub fn with(mut self, backend: Backend, provider: Arc<dyn ChatProvider>) -> Self {
        self.providers.insert(backend, provider);
        self
    }

    pub fn get(&self, backend: Backend) -> Option<&Arc<dyn ChatProvider>> {
        self.providers.get(&backend)
    }

    /// Whether an adapter exists for `backend` and holds a credential.
    pub fn is_available(&self, backend: Backend) -> bool {
        self.get(backend).is_some_and(|p| p.is_configured())
    }

    /// Credential status per backend name, in a stable order.
    pub fn status(&self) -> Vec<(Backend, bool)> {
        Backend::ALL
            .into_iter()
            .map(|b| (b, self.is_available(b)))
            .collect()
    }
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.status().into_iter().map(|(b, ok)| (b.as_str(), ok)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_core::config::schema::ProviderConfig;

    #[test]
    fn test_from_config_availability() {
        let config = ProvidersConfig {
            openrouter: ProviderConfig {
                api_key: "sk-or-test".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let set = ProviderSet::from_config(&config, &Attribution::default());

        assert!(set.is_available(Backend::OpenRouter));
        assert!(!set.is_available(Backend::Groq));
        assert!(!set.is_available(Backend::Replicate));
        assert_eq!(set.get(Backend::Replicate).unwrap().display_name(), "Replicate");
    }

    #[test]
    fn test_empty_set() {
        let set = ProviderSet::new();
        assert!(set.get(Backend::Groq).is_none());
        assert_eq!(
            set.status(),
            vec![
                (Backend::OpenRouter, false),
                (Backend::Groq, false),
                (Backend::Replicate, false)
            ]
        );
    }
}
