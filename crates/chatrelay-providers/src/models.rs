//! Model catalog — maps client-visible model ids to upstream invocation
//! parameters.
//!
//! The registry is built once at startup (built-in table, or the `models`
//! array from the config file) and is read-only afterwards.

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

use chatrelay_core::config::{Config, ModelEntry};

use crate::registry::Backend;

// ─────────────────────────────────────────────
// ModelDescriptor
// ─────────────────────────────────────────────

/// Organisation that trained the model (shown in the models listing).
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub enum ModelFamily {
    Google,
    Meta,
    OpenAI,
    Qwen,
    Nvidia,
    Mistral,
    #[serde(untagged)]
    Other(String),
}

impl ModelFamily {
    fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "google" => ModelFamily::Google,
            "meta" => ModelFamily::Meta,
            "openai" => ModelFamily::OpenAI,
            "qwen" | "alibaba" => ModelFamily::Qwen,
            "nvidia" => ModelFamily::Nvidia,
            "mistral" => ModelFamily::Mistral,
            _ => ModelFamily::Other(name.to_string()),
        }
    }
}

/// Everything needed to invoke one model upstream.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    #[serde(rename = "id")]
    pub client_id: String,
    #[serde(rename = "upstreamModel")]
    pub upstream_model_id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub description: String,
    #[serde(rename = "provider")]
    pub family: ModelFamily,
    pub backend: Backend,
    /// Replicate `prompt_template`; unused by chat-completions backends.
    #[serde(skip)]
    pub prompt_template: Option<String>,
    /// Sampling parameters merged into the upstream request.
    #[serde(skip)]
    pub params: Map<String, Value>,
}

impl ModelDescriptor {
    fn matches(&self, id: &str) -> bool {
        self.client_id == id || self.upstream_model_id == id
    }
}

impl TryFrom<ModelEntry> for ModelDescriptor {
    type Error = RegistryError;

    fn try_from(entry: ModelEntry) -> Result<Self, Self::Error> {
        let backend = Backend::parse(&entry.backend).ok_or_else(|| RegistryError::UnknownBackend {
            model: entry.id.clone(),
            backend: entry.backend.clone(),
        })?;

        Ok(ModelDescriptor {
            client_id: entry.id,
            upstream_model_id: entry.upstream_model,
            display_name: entry.name,
            description: entry.description,
            family: ModelFamily::parse(&entry.family),
            backend,
            prompt_template: entry.prompt_template,
            params: entry.params,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("model table is empty")]
    Empty,
    #[error("default model '{0}' is not in the model table")]
    UnknownDefault(String),
    #[error("duplicate model id '{0}'")]
    DuplicateId(String),
    #[error("model '{model}' has unknown backend '{backend}'")]
    UnknownBackend { model: String, backend: String },
}

// ─────────────────────────────────────────────
// ModelRegistry
// ─────────────────────────────────────────────

/// Immutable lookup table of chat models with a designated default.
#[derive(Clone, Debug)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
    default_index: usize,
}

impl ModelRegistry {
    pub fn new(models: Vec<ModelDescriptor>, default_id: &str) -> Result<Self, RegistryError> {
        if models.is_empty() {
            return Err(RegistryError::Empty);
        }
        for (i, model) in models.iter().enumerate() {
            if models[..i].iter().any(|m| m.client_id == model.client_id) {
                return Err(RegistryError::DuplicateId(model.client_id.clone()));
            }
        }
        let default_index = models
            .iter()
            .position(|m| m.matches(default_id))
            .ok_or_else(|| RegistryError::UnknownDefault(default_id.to_string()))?;

        Ok(Self {
            models,
            default_index,
        })
    }

    /// The built-in catalog with `default_id` as the default.
    pub fn builtin(default_id: &str) -> Result<Self, RegistryError> {
        Self::new(builtin_models(), default_id)
    }

    /// Built from config: the `models` table if present, else the built-in one.
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let default_id = &config.chat.default_model;
        if config.models.is_empty() {
            return Self::builtin(default_id);
        }

        let models = config
            .models
            .iter()
            .cloned()
            .map(ModelDescriptor::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = models.len(), "using model table from config");
        Self::new(models, default_id)
    }

    /// Resolve a requested model. Never fails: absent or unknown ids yield the
    /// default descriptor.
    pub fn lookup(&self, id: Option<&str>) -> &ModelDescriptor {
        match id {
            Some(id) => self.get(id).unwrap_or_else(|| {
                debug!(requested = id, "unknown model, using default");
                self.default_model()
            }),
            None => self.default_model(),
        }
    }

    /// Exact lookup by client id or upstream id.
    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.matches(id))
    }

    pub fn default_model(&self) -> &ModelDescriptor {
        &self.models[self.default_index]
    }

    pub fn all(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

// ─────────────────────────────────────────────
// Built-in catalog
// ─────────────────────────────────────────────

const LLAMA3_PROMPT_TEMPLATE: &str = "<|begin_of_text|><|start_header_id|>system<|end_header_id|>\n\n\
{system_prompt}<|eot_id|><|start_header_id|>user<|end_header_id|>\n\n\
{prompt}<|eot_id|><|start_header_id|>assistant<|end_header_id|>\n\n";

/// One row of the stock model table.
struct BuiltinModel {
    id: &'static str,
    upstream: &'static str,
    name: &'static str,
    description: &'static str,
    family: ModelFamily,
    backend: Backend,
}

static BUILTIN_MODELS: &[BuiltinModel] = &[
    // OpenRouter free tier
    BuiltinModel {
        id: "gpt-oss-20b",
        upstream: "openai/gpt-oss-20b:free",
        name: "GPT OSS 20B",
        description: "Open-source model with good general performance",
        family: ModelFamily::OpenAI,
        backend: Backend::OpenRouter,
    },
    BuiltinModel {
        id: "gpt-oss-120b",
        upstream: "openai/gpt-oss-120b:free",
        name: "GPT OSS 120B",
        description: "Powerful open-source model for complex tasks",
        family: ModelFamily::OpenAI,
        backend: Backend::OpenRouter,
    },
    BuiltinModel {
        id: "gemma-3-4b",
        upstream: "google/gemma-3-4b-it:free",
        name: "Gemma 3 4B",
        description: "Fast and efficient model for everyday questions",
        family: ModelFamily::Google,
        backend: Backend::OpenRouter,
    },
    BuiltinModel {
        id: "gemma-3-12b",
        upstream: "google/gemma-3-12b-it:free",
        name: "Gemma 3 12B",
        description: "Balanced performance and quality for general use",
        family: ModelFamily::Google,
        backend: Backend::OpenRouter,
    },
    BuiltinModel {
        id: "gemma-3-27b",
        upstream: "google/gemma-3-27b-it:free",
        name: "Gemma 3 27B",
        description: "Powerful model for complex questions",
        family: ModelFamily::Google,
        backend: Backend::OpenRouter,
    },
    BuiltinModel {
        id: "llama-3.2-3b",
        upstream: "meta-llama/llama-3.2-3b-instruct:free",
        name: "Llama 3.2 3B",
        description: "Lightweight and responsive for quick answers",
        family: ModelFamily::Meta,
        backend: Backend::OpenRouter,
    },
    BuiltinModel {
        id: "llama-3.3-70b",
        upstream: "meta-llama/llama-3.3-70b-instruct:free",
        name: "Llama 3.3 70B",
        description: "Advanced reasoning and detailed responses",
        family: ModelFamily::Meta,
        backend: Backend::OpenRouter,
    },
    BuiltinModel {
        id: "qwen-2.5-72b",
        upstream: "qwen/qwen-2.5-72b-instruct:free",
        name: "Qwen 2.5 72B",
        description: "Strong multilingual and coding ability",
        family: ModelFamily::Qwen,
        backend: Backend::OpenRouter,
    },
    BuiltinModel {
        id: "nemotron-nano-12b-v2",
        upstream: "nvidia/nemotron-nano-12b-v2-vl:free",
        name: "Nemotron Nano 12B v2",
        description: "Compact NVIDIA model tuned for instruction following",
        family: ModelFamily::Nvidia,
        backend: Backend::OpenRouter,
    },
    // Groq
    BuiltinModel {
        id: "groq-llama-3.3-70b",
        upstream: "llama-3.3-70b-versatile",
        name: "Llama 3.3 70B (Groq)",
        description: "Llama 3.3 on Groq's low-latency inference",
        family: ModelFamily::Meta,
        backend: Backend::Groq,
    },
    BuiltinModel {
        id: "groq-llama-3.1-8b",
        upstream: "llama-3.1-8b-instant",
        name: "Llama 3.1 8B Instant (Groq)",
        description: "Small, very fast model for short answers",
        family: ModelFamily::Meta,
        backend: Backend::Groq,
    },
    // Replicate
    BuiltinModel {
        id: "llama-3-70b",
        upstream: "meta/meta-llama-3-70b-instruct",
        name: "Llama 3 70B (Replicate)",
        description: "Llama 3 70B Instruct served by Replicate",
        family: ModelFamily::Meta,
        backend: Backend::Replicate,
    },
    BuiltinModel {
        id: "llama-3-8b",
        upstream: "meta/meta-llama-3-8b-instruct",
        name: "Llama 3 8B (Replicate)",
        description: "Llama 3 8B Instruct served by Replicate",
        family: ModelFamily::Meta,
        backend: Backend::Replicate,
    },
];

/// Sampling parameters each backend gets by default.
fn default_params(backend: Backend) -> Map<String, Value> {
    let params = match backend {
        Backend::OpenRouter => json!({}),
        Backend::Groq => json!({ "temperature": 0.7, "max_tokens": 1024 }),
        Backend::Replicate => json!({ "temperature": 0.7, "top_p": 0.9, "max_tokens": 1024 }),
    };
    match params {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// The stock model table.
pub fn builtin_models() -> Vec<ModelDescriptor> {
    BUILTIN_MODELS
        .iter()
        .map(|row| ModelDescriptor {
            client_id: row.id.to_string(),
            upstream_model_id: row.upstream.to_string(),
            display_name: row.name.to_string(),
            description: row.description.to_string(),
            family: row.family.clone(),
            backend: row.backend,
            prompt_template: (row.backend == Backend::Replicate)
                .then(|| LLAMA3_PROMPT_TEMPLATE.to_string()),
            params: default_params(row.backend),
        })
        .collect()
}

// ─────────────────────────────────────────────
// Image models
// ─────────────────────────────────────────────

/// A Replicate diffusion model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageModel {
    pub client_id: &'static str,
    /// `owner/name` or version-pinned `owner/name:version`.
    pub upstream_model_id: &'static str,
}

/// Supported image models; the first entry is the fallback for unknown ids.
pub static IMAGE_MODELS: &[ImageModel] = &[
    ImageModel {
        client_id: "flux-schnell",
        upstream_model_id: "black-forest-labs/flux-schnell",
    },
    ImageModel {
        client_id: "flux-dev",
        upstream_model_id: "black-forest-labs/flux-dev",
    },
    ImageModel {
        client_id: "stable-diffusion-xl",
        upstream_model_id: "stability-ai/sdxl:7762fd07cf82c948538e41f63f77d685e02b063e37e496e96eefd46c929f9bdc",
    },
    ImageModel {
        client_id: "imagen-4-fast",
        upstream_model_id: "google/imagen-4-fast",
    },
    ImageModel {
        client_id: "photon",
        upstream_model_id: "luma/photon",
    },
];

/// Resolve an image model id; unknown or absent ids fall back to `default_id`,
/// then to the first table entry.
pub fn find_image_model(id: Option<&str>, default_id: &str) -> &'static ImageModel {
    let by_id = |wanted: &str| IMAGE_MODELS.iter().find(|m| m.client_id == wanted);
    id.and_then(by_id)
        .or_else(|| by_id(default_id))
        .unwrap_or(&IMAGE_MODELS[0])
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        ModelRegistry::builtin("gpt-oss-20b").unwrap()
    }

    #[test]
    fn test_lookup_by_client_id() {
        let m = registry().lookup(Some("gemma-3-27b")).clone();
        assert_eq!(m.upstream_model_id, "google/gemma-3-27b-it:free");
        assert_eq!(m.backend, Backend::OpenRouter);
        assert_eq!(m.family, ModelFamily::Google);
    }

    #[test]
    fn test_lookup_by_upstream_id() {
        let reg = registry();
        let m = reg.lookup(Some("meta-llama/llama-3.3-70b-instruct:free"));
        assert_eq!(m.client_id, "llama-3.3-70b");
    }

    #[test]
    fn test_lookup_unknown_falls_back_to_default() {
        let reg = registry();
        assert_eq!(reg.lookup(Some("gpt-9-ultra")).client_id, "gpt-oss-20b");
        assert_eq!(reg.lookup(None).client_id, "gpt-oss-20b");
        assert!(reg.get("gpt-9-ultra").is_none());
    }

    #[test]
    fn test_unknown_default_is_an_error() {
        let err = ModelRegistry::builtin("nope").unwrap_err();
        assert_eq!(err, RegistryError::UnknownDefault("nope".into()));
    }

    #[test]
    fn test_builtin_ids_unique_and_templates() {
        let models = builtin_models();
        let reg = ModelRegistry::new(models.clone(), "gpt-oss-20b").unwrap();
        assert_eq!(reg.len(), models.len());

        for m in reg.all() {
            assert_eq!(m.prompt_template.is_some(), m.backend == Backend::Replicate);
        }
    }

    #[test]
    fn test_builtin_params_follow_backend() {
        let reg = registry();
        assert!(reg.get("gpt-oss-20b").unwrap().params.is_empty());
        assert_eq!(reg.get("groq-llama-3.1-8b").unwrap().params["max_tokens"], 1024);
        assert_eq!(reg.get("llama-3-8b").unwrap().params["top_p"], 0.9);
        assert_eq!(reg.get("qwen-2.5-72b").unwrap().family, ModelFamily::Qwen);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut models = builtin_models();
        models.push(models[0].clone());
        assert_eq!(
            ModelRegistry::new(models, "gpt-oss-20b").unwrap_err(),
            RegistryError::DuplicateId("gpt-oss-20b".into())
        );
    }

    #[test]
    fn test_from_config_table() {
        let mut config = Config::default();
        config.chat.default_model = "mixtral".into();
        config.models = vec![ModelEntry {
            id: "mixtral".into(),
            upstream_model: "mistralai/mixtral-8x7b-instruct".into(),
            name: "Mixtral".into(),
            description: String::new(),
            family: "Mistral".into(),
            backend: "openrouter".into(),
            prompt_template: None,
            params: Map::new(),
        }];

        let reg = ModelRegistry::from_config(&config).unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.default_model().family, ModelFamily::Mistral);
    }

    #[test]
    fn test_from_config_unknown_backend() {
        let mut config = Config::default();
        config.models = vec![ModelEntry {
            id: "x".into(),
            upstream_model: "x".into(),
            name: "X".into(),
            description: String::new(),
            family: String::new(),
            backend: "bedrock".into(),
            prompt_template: None,
            params: Map::new(),
        }];

        assert!(matches!(
            ModelRegistry::from_config(&config),
            Err(RegistryError::UnknownBackend { .. })
        ));
    }

    #[test]
    fn test_descriptor_serialization_hides_params() {
        let reg = registry();
        let json = serde_json::to_value(reg.lookup(Some("groq-llama-3.1-8b"))).unwrap();

        assert_eq!(json["id"], "groq-llama-3.1-8b");
        assert_eq!(json["name"], "Llama 3.1 8B Instant (Groq)");
        assert_eq!(json["provider"], "Meta");
        assert_eq!(json["backend"], "groq");
        assert!(json.get("params").is_none());
    }

    #[test]
    fn test_other_family_serializes_as_string() {
        let json = serde_json::to_value(ModelFamily::parse("DeepSeek")).unwrap();
        assert_eq!(json, "DeepSeek");
    }

    #[test]
    fn test_find_image_model() {
        assert_eq!(
            find_image_model(Some("photon"), "flux-schnell").upstream_model_id,
            "luma/photon"
        );
        assert_eq!(
            find_image_model(Some("dall-e"), "flux-dev").client_id,
            "flux-dev"
        );
        assert_eq!(find_image_model(None, "nope").client_id, "flux-schnell");
    }
}
