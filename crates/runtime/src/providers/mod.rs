//! LLM provider adapters.
//!
//! Each adapter implements [`Backend`] for one provider API, normalizing
//! its tool-call framing so the turn loop never sees wire differences.

mod anthropic;
mod gemini;
mod openai;

pub use anthropic::{AnthropicBackend, AnthropicBackendBuilder};
pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;

use crate::model::{Backend, ModelError, ModelRequest, ModelResponse};
use serde::{Deserialize, Serialize};

/// The configured provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    OpenAi,
    Anthropic,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::OpenAi => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// The selected backend, one variant per provider.
#[derive(Clone)]
pub enum ProviderBackend {
    Gemini(GeminiBackend),
    OpenAi(OpenAiBackend),
    Anthropic(AnthropicBackend),
}

impl ProviderBackend {
    /// Build the adapter variant for the configured provider.
    pub fn create(provider: Provider, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        match provider {
            Provider::Gemini => Self::Gemini(GeminiBackend::new(api_key, model)),
            Provider::OpenAi => Self::OpenAi(OpenAiBackend::new(api_key, model)),
            Provider::Anthropic => Self::Anthropic(AnthropicBackend::builder(api_key, model).build()),
        }
    }
}

impl std::fmt::Display for ProviderBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini(b) => b.fmt(f),
            Self::OpenAi(b) => b.fmt(f),
            Self::Anthropic(b) => b.fmt(f),
        }
    }
}

impl Backend for ProviderBackend {
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        match self {
            Self::Gemini(b) => b.generate(request).await,
            Self::OpenAi(b) => b.generate(request).await,
            Self::Anthropic(b) => b.generate(request).await,
        }
    }
}
