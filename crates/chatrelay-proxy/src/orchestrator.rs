//! Fallback orchestrator — walks a [`FallbackPlan`] until a model answers.
//!
//! Attempts are strictly sequential. A retryable failure (rate limit or
//! timeout) moves on to the next candidate; anything else ends the request.

use std::time::Duration;

use tracing::{debug, info, warn};

use chatrelay_core::types::Message;
use chatrelay_core::{clean, normalize, ChatRequest};
use chatrelay_providers::{ModelDescriptor, ProviderError, ProviderSet};

use crate::error::ApiError;
use crate::plan::FallbackPlan;
use crate::state::AppState;

/// A successful completion and how it was obtained.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Client id of the model that answered.
    pub model: String,
    /// Number of upstream calls made, including the successful one.
    pub attempts: usize,
}

/// Run a chat request end to end: normalize, plan, attempt, clean.
///
/// Shared by `POST /api/chat` and the terminal client. The returned text is
/// already post-processed.
pub async fn answer(state: &AppState, request: ChatRequest) -> Result<Completion, ApiError> {
    let canonical = normalize(
        request,
        &state.chat.system_prompt,
        state.chat.max_history_turns,
    )?;

    let primary = state.registry.lookup(canonical.model.as_deref());
    let plan = FallbackPlan::build(
        primary,
        &state.chat.fallback_models,
        &state.registry,
        &state.providers,
    );
    debug!(
        requested = canonical.model.as_deref().unwrap_or("-"),
        model = %primary.client_id,
        candidates = plan.len(),
        turns = canonical.messages.len(),
        "chat request"
    );

    let completion = complete(
        &plan,
        &canonical.messages,
        &state.providers,
        state.attempt_timeout(),
    )
    .await
    .map_err(ApiError::Chat)?;

    info!(
        model = %completion.model,
        attempts = completion.attempts,
        chars = completion.text.len(),
        "chat completed"
    );

    Ok(Completion {
        text: clean(&completion.text),
        ..completion
    })
}

pub async fn complete(
    plan: &FallbackPlan,
    messages: &[Message],
    providers: &ProviderSet,
    attempt_timeout: Option<Duration>,
) -> Result<Completion, ProviderError> {
    let total = plan.len();
    let mut last_error = None;

    for (i, model) in plan.candidates().iter().enumerate() {
        let attempt = i + 1;
        debug!(attempt, total, model = %model.client_id, backend = %model.backend, "attempting model");

        match attempt_once(model, messages, providers, attempt_timeout).await {
            Ok(text) => {
                if attempt > 1 {
                    info!(attempt, model = %model.client_id, "served by fallback model");
                }
                return Ok(Completion {
                    text,
                    model: model.client_id.clone(),
                    attempts: attempt,
                });
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    attempt,
                    total,
                    model = %model.client_id,
                    provider = e.provider(),
                    error = %e,
                    "retryable failure, trying next model"
                );
                last_error = Some(e);
            }
            Err(e) => {
                warn!(attempt, model = %model.client_id, provider = e.provider(), error = %e, "non-retryable failure");
                return Err(e);
            }
        }
    }

    warn!(attempts = total, "all candidate models failed");
    Err(last_error.unwrap_or(ProviderError::RateLimited {
        provider: "none",
        model: String::new(),
    }))
}

async fn attempt_once(
    model: &ModelDescriptor,
    messages: &[Message],
    providers: &ProviderSet,
    attempt_timeout: Option<Duration>,
) -> Result<String, ProviderError> {
    let spec = model.backend.spec();
    let Some(provider) = providers.get(model.backend) else {
        return Err(ProviderError::MissingApiKey {
            provider: spec.display_name,
        });
    };

    let call = provider.complete(messages, model);
    match attempt_timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .unwrap_or_else(|_| {
                Err(ProviderError::Timeout {
                    provider: spec.display_name,
                    model: model.upstream_model_id.clone(),
                })
            }),
        None => call.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::testing::{FakeProvider, Outcome};
    use chatrelay_core::config::Config;
    use chatrelay_core::types::Role;
    use chatrelay_core::ChatTurn;
    use chatrelay_providers::{Backend, ModelRegistry};

    fn messages() -> Vec<Message> {
        vec![Message::system("sys"), Message::user("hi")]
    }

    fn plan_for(providers: &ProviderSet, fallbacks: &[&str]) -> FallbackPlan {
        let reg = ModelRegistry::builtin("gpt-oss-20b").unwrap();
        let fallbacks: Vec<String> = fallbacks.iter().map(|s| s.to_string()).collect();
        FallbackPlan::build(reg.lookup(None), &fallbacks, &reg, providers)
    }

    #[tokio::test]
    async fn test_primary_success_single_call() {
        let fake = FakeProvider::new(Outcome::Reply("hello".into())).arc();
        let providers = ProviderSet::new().with(Backend::OpenRouter, fake.clone());
        let plan = plan_for(&providers, &["gemma-3-27b"]);

        let done = complete(&plan, &messages(), &providers, None).await.unwrap();
        assert_eq!(done.text, "hello");
        assert_eq!(done.model, "gpt-oss-20b");
        assert_eq!(done.attempts, 1);
        assert_eq!(fake.calls(), vec!["openai/gpt-oss-20b:free"]);
    }

    #[tokio::test]
    async fn test_rate_limit_falls_back() {
        let fake = FakeProvider::new(Outcome::Reply("from fallback".into()))
            .on("openai/gpt-oss-20b:free", Outcome::RateLimited)
            .arc();
        let providers = ProviderSet::new().with(Backend::OpenRouter, fake.clone());
        let plan = plan_for(&providers, &["gemma-3-27b", "llama-3.3-70b"]);

        let done = complete(&plan, &messages(), &providers, None).await.unwrap();
        assert_eq!(done.text, "from fallback");
        assert_eq!(done.model, "gemma-3-27b");
        assert_eq!(done.attempts, 2);
        assert_eq!(fake.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_all_rate_limited_tries_every_candidate_once() {
        let fake = FakeProvider::new(Outcome::RateLimited).arc();
        let providers = ProviderSet::new().with(Backend::OpenRouter, fake.clone());
        let plan = plan_for(&providers, &["gemma-3-27b", "llama-3.3-70b", "gemma-3-27b"]);

        let err = complete(&plan, &messages(), &providers, None).await.unwrap_err();
        assert!(err.is_rate_limited());

        let calls = fake.calls();
        assert_eq!(calls.len(), plan.len());
        let mut distinct = calls.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), calls.len());
    }

    #[tokio::test]
    async fn test_non_retryable_stops_immediately() {
        let fake = FakeProvider::new(Outcome::Upstream).arc();
        let providers = ProviderSet::new().with(Backend::OpenRouter, fake.clone());
        let plan = plan_for(&providers, &["gemma-3-27b", "llama-3.3-70b"]);

        let err = complete(&plan, &messages(), &providers, None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Upstream { .. }));
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_key_on_primary_is_not_retried() {
        let fake = FakeProvider::new(Outcome::Reply("never".into()))
            .unconfigured()
            .arc();
        let providers = ProviderSet::new().with(Backend::OpenRouter, fake.clone());
        let plan = plan_for(&providers, &["gemma-3-27b"]);

        // unconfigured backend → fallbacks dropped from the plan
        assert_eq!(plan.len(), 1);
        let err = complete(&plan, &messages(), &providers, None).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey { .. }));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_adapter_is_auth_error() {
        let providers = ProviderSet::new();
        let plan = plan_for(&providers, &[]);
        let err = complete(&plan, &messages(), &providers, None).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey { provider: "OpenRouter" }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_moves_to_next_model() {
        let fake = FakeProvider::new(Outcome::Reply("quick".into()))
            .on(
                "openai/gpt-oss-20b:free",
                Outcome::Slow(Duration::from_secs(600)),
            )
            .arc();
        let providers = ProviderSet::new().with(Backend::OpenRouter, fake.clone());
        let plan = plan_for(&providers, &["gemma-3-12b"]);

        let done = complete(&plan, &messages(), &providers, Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(done.text, "quick");
        assert_eq!(done.model, "gemma-3-12b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_on_last_candidate_is_timeout_error() {
        let fake = FakeProvider::new(Outcome::Slow(Duration::from_secs(600))).arc();
        let providers = ProviderSet::new().with(Backend::OpenRouter, fake);
        let plan = plan_for(&providers, &[]);

        let err = complete(&plan, &messages(), &providers, Some(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout { .. }));
    }

    fn state_with(fake: Arc<FakeProvider>) -> AppState {
        let mut state = AppState::from_config(&Config::default()).unwrap();
        state.providers = ProviderSet::new().with(Backend::OpenRouter, fake);
        state
    }

    #[tokio::test]
    async fn test_answer_cleans_and_prepends_system_prompt() {
        let fake = FakeProvider::new(Outcome::Reply(": first\n: second".into())).arc();
        let state = state_with(fake.clone());

        let request = ChatRequest {
            messages: Some(vec![ChatTurn {
                role: Role::User,
                content: "list two things".into(),
            }]),
            ..Default::default()
        };
        let done = answer(&state, request).await.unwrap();
        assert_eq!(done.text, "- first\n- second");
        assert_eq!(done.model, "gpt-oss-20b");

        let sent = fake.last_messages();
        assert!(matches!(sent.first(), Some(Message::System { .. })));
    }

    #[tokio::test]
    async fn test_answer_rejects_before_any_call() {
        let fake = FakeProvider::new(Outcome::Reply("never".into())).arc();
        let state = state_with(fake.clone());

        let err = answer(&state, ChatRequest::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_answer_wraps_provider_failure() {
        let fake = FakeProvider::new(Outcome::RateLimited).arc();
        let state = state_with(fake);

        let request = ChatRequest {
            message: Some("hi".into()),
            ..Default::default()
        };
        let err = answer(&state, request).await.unwrap_err();
        assert!(matches!(err, ApiError::Chat(ref e) if e.is_rate_limited()));
    }
}
