//! Fallback plan — the ordered list of models one chat request may try.

use tracing::{debug, warn};

use chatrelay_providers::{ModelDescriptor, ModelRegistry, ProviderSet};

/// Requested model first, then the configured fallbacks.
///
/// No upstream model id appears twice. Fallbacks that are unknown to the
/// registry or whose backend has no credential are left out; the primary is
/// always kept so a missing primary credential surfaces as an auth error.
#[derive(Clone, Debug)]
pub struct FallbackPlan {
    candidates: Vec<ModelDescriptor>,
}

impl FallbackPlan {
    pub fn build(
        primary: &ModelDescriptor,
        fallback_ids: &[String],
        registry: &ModelRegistry,
        providers: &ProviderSet,
    ) -> Self {
        let mut candidates = vec![primary.clone()];

        for id in fallback_ids {
            let Some(model) = registry.get(id) else {
                warn!(model = %id, "fallback model not in registry, skipping");
                continue;
            };
            if candidates
                .iter()
                .any(|c| c.upstream_model_id == model.upstream_model_id)
            {
                continue;
            }
            if !providers.is_available(model.backend) {
                debug!(model = %id, backend = %model.backend, "fallback backend not configured, skipping");
                continue;
            }
            candidates.push(model.clone());
        }

        Self { candidates }
    }

    pub fn candidates(&self) -> &[ModelDescriptor] {
        &self.candidates
    }

    pub fn primary(&self) -> &ModelDescriptor {
        &self.candidates[0]
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;
    use chatrelay_providers::Backend;

    fn registry() -> ModelRegistry {
        ModelRegistry::builtin("gpt-oss-20b").unwrap()
    }

    fn ids(plan: &FallbackPlan) -> Vec<&str> {
        plan.candidates()
            .iter()
            .map(|c| c.client_id.as_str())
            .collect()
    }

    fn openrouter_only() -> ProviderSet {
        ProviderSet::new().with(Backend::OpenRouter, FakeProvider::replying("ok"))
    }

    #[test]
    fn test_primary_then_fallbacks_in_order() {
        let reg = registry();
        let fallbacks = vec!["gemma-3-27b".to_string(), "llama-3.3-70b".to_string()];
        let plan = FallbackPlan::build(reg.lookup(None), &fallbacks, &reg, &openrouter_only());

        assert_eq!(ids(&plan), vec!["gpt-oss-20b", "gemma-3-27b", "llama-3.3-70b"]);
        assert_eq!(plan.primary().client_id, "gpt-oss-20b");
    }

    #[test]
    fn test_primary_not_repeated() {
        let reg = registry();
        let fallbacks = vec![
            "gemma-3-27b".to_string(),
            // same upstream id, by its upstream name
            "google/gemma-3-27b-it:free".to_string(),
            "gemma-3-12b".to_string(),
        ];
        let plan = FallbackPlan::build(
            reg.lookup(Some("gemma-3-27b")),
            &fallbacks,
            &reg,
            &openrouter_only(),
        );
        assert_eq!(ids(&plan), vec!["gemma-3-27b", "gemma-3-12b"]);
    }

    #[test]
    fn test_unknown_and_unconfigured_fallbacks_skipped() {
        let reg = registry();
        let fallbacks = vec![
            "does-not-exist".to_string(),
            "groq-llama-3.3-70b".to_string(),
            "qwen-2.5-72b".to_string(),
        ];
        let plan = FallbackPlan::build(reg.lookup(None), &fallbacks, &reg, &openrouter_only());
        assert_eq!(ids(&plan), vec!["gpt-oss-20b", "qwen-2.5-72b"]);
    }

    #[test]
    fn test_unconfigured_primary_is_kept() {
        let reg = registry();
        let plan = FallbackPlan::build(
            reg.lookup(Some("llama-3-70b")),
            &[],
            &reg,
            &ProviderSet::new(),
        );
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.primary().backend, Backend::Replicate);
    }
}
