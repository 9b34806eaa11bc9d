//! In-process fakes for router and orchestrator tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use chatrelay_core::types::Message;
use chatrelay_providers::{
    AudioClip, ChatProvider, ImageModel, ImageProvider, ModelDescriptor, ProviderError,
    TranscriptionProvider,
};

/// What a fake adapter does for one upstream model.
#[derive(Clone, Debug)]
pub(crate) enum Outcome {
    Reply(String),
    RateLimited,
    Upstream,
    Slow(Duration),
}

/// Scripted `ChatProvider` that records every upstream model id it is asked for.
pub(crate) struct FakeProvider {
    default: Outcome,
    per_model: HashMap<String, Outcome>,
    configured: bool,
    calls: Mutex<Vec<String>>,
    last_messages: Mutex<Vec<Message>>,
}

impl FakeProvider {
    pub fn new(default: Outcome) -> Self {
        Self {
            default,
            per_model: HashMap::new(),
            configured: true,
            calls: Mutex::new(Vec::new()),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(Outcome::Reply(text.to_string())).arc()
    }

    /// Override the outcome for one upstream model id.
    pub fn on(mut self, upstream_model: &str, outcome: Outcome) -> Self {
        self.per_model.insert(upstream_model.to_string(), outcome);
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_messages(&self) -> Vec<Message> {
        self.last_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for FakeProvider {
    async fn complete(
        &self,
        messages: &[Message],
        model: &ModelDescriptor,
    ) -> Result<String, ProviderError> {
        if !self.configured {
            return Err(ProviderError::MissingApiKey { provider: "Fake" });
        }
        self.calls
            .lock()
            .unwrap()
            .push(model.upstream_model_id.clone());
        *self.last_messages.lock().unwrap() = messages.to_vec();

        let outcome = self
            .per_model
            .get(&model.upstream_model_id)
            .unwrap_or(&self.default)
            .clone();

        match outcome {
            Outcome::Reply(text) => Ok(text),
            Outcome::RateLimited => Err(ProviderError::RateLimited {
                provider: "Fake",
                model: model.upstream_model_id.clone(),
            }),
            Outcome::Upstream => Err(ProviderError::Upstream {
                provider: "Fake",
                status: Some(500),
                message: "returned 500".into(),
                body: "{\"trace\":\"upstream-secret\"}".into(),
            }),
            Outcome::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok("too late".into())
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn display_name(&self) -> &str {
        "Fake"
    }
}

/// Image provider returning fixed bytes, or failing.
pub(crate) struct FakeImages {
    pub result: Result<Vec<u8>, &'static str>,
    pub configured: bool,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl FakeImages {
    pub fn returning(bytes: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(bytes.to_vec()),
            configured: true,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            result: Err("prediction failed"),
            configured: true,
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ImageProvider for FakeImages {
    async fn generate_image(
        &self,
        model: &ImageModel,
        prompt: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        self.prompts
            .lock()
            .unwrap()
            .push((model.client_id.to_string(), prompt.to_string()));
        self.result.clone().map_err(|msg| ProviderError::Upstream {
            provider: "Fake",
            status: None,
            message: msg.into(),
            body: String::new(),
        })
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

/// Transcriber echoing the clip's file name, or failing.
pub(crate) struct FakeTranscriber {
    pub configured: bool,
    pub fail: bool,
    pub calls: Mutex<usize>,
}

impl FakeTranscriber {
    pub fn new(configured: bool, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            configured,
            fail,
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TranscriptionProvider for FakeTranscriber {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, ProviderError> {
        if !self.configured {
            return Err(ProviderError::MissingApiKey { provider: "Groq" });
        }
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(ProviderError::Upstream {
                provider: "Groq",
                status: Some(400),
                message: "transcription API returned 400 Bad Request".into(),
                body: "raw groq body".into(),
            });
        }
        Ok(format!("transcribed {} ({} bytes)", clip.file_name, clip.bytes.len()))
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn display_name(&self) -> &str {
        "Fake Whisper"
    }
}
