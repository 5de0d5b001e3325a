//! Static model catalog.
//!
//! Per-provider tables mapping a short model id to the provider's API
//! model string, mainly so the CLI can list what is available and
//! resolve a configured id without the user memorizing dated API
//! strings.

use crate::providers::Provider;

/// One catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: Provider,
    /// The exact model string sent on the wire.
    pub api_model: &'static str,
    pub context_window: u64,
    pub default_max_tokens: u64,
}

pub const GEMINI_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "gemini-2.5-flash",
        name: "Gemini 2.5 Flash",
        provider: Provider::Gemini,
        api_model: "gemini-2.5-flash-preview-04-17",
        context_window: 1_000_000,
        default_max_tokens: 50_000,
    },
    ModelInfo {
        id: "gemini-2.5",
        name: "Gemini 2.5 Pro",
        provider: Provider::Gemini,
        api_model: "gemini-2.5-pro-preview-03-25",
        context_window: 1_000_000,
        default_max_tokens: 50_000,
    },
    ModelInfo {
        id: "gemini-2.0-flash",
        name: "Gemini 2.0 Flash",
        provider: Provider::Gemini,
        api_model: "gemini-2.0-flash",
        context_window: 1_000_000,
        default_max_tokens: 6_000,
    },
    ModelInfo {
        id: "gemini-2.0-flash-lite",
        name: "Gemini 2.0 Flash Lite",
        provider: Provider::Gemini,
        api_model: "gemini-2.0-flash-lite",
        context_window: 1_000_000,
        default_max_tokens: 6_000,
    },
];

pub const OPENAI_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "gpt-4o",
        name: "GPT-4o",
        provider: Provider::OpenAi,
        api_model: "gpt-4o",
        context_window: 128_000,
        default_max_tokens: 16_384,
    },
    ModelInfo {
        id: "gpt-4o-mini",
        name: "GPT-4o Mini",
        provider: Provider::OpenAi,
        api_model: "gpt-4o-mini",
        context_window: 128_000,
        default_max_tokens: 16_384,
    },
    ModelInfo {
        id: "gpt-4.1",
        name: "GPT-4.1",
        provider: Provider::OpenAi,
        api_model: "gpt-4.1",
        context_window: 1_000_000,
        default_max_tokens: 32_768,
    },
    ModelInfo {
        id: "gpt-4.1-mini",
        name: "GPT-4.1 Mini",
        provider: Provider::OpenAi,
        api_model: "gpt-4.1-mini",
        context_window: 1_000_000,
        default_max_tokens: 32_768,
    },
];

pub const ANTHROPIC_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "claude-3.5-sonnet",
        name: "Claude 3.5 Sonnet",
        provider: Provider::Anthropic,
        api_model: "claude-3-5-sonnet-latest",
        context_window: 200_000,
        default_max_tokens: 5_000,
    },
    ModelInfo {
        id: "claude-3.5-haiku",
        name: "Claude 3.5 Haiku",
        provider: Provider::Anthropic,
        api_model: "claude-3-5-haiku-latest",
        context_window: 200_000,
        default_max_tokens: 4_096,
    },
    ModelInfo {
        id: "claude-3.7-sonnet",
        name: "Claude 3.7 Sonnet",
        provider: Provider::Anthropic,
        api_model: "claude-3-7-sonnet-latest",
        context_window: 200_000,
        default_max_tokens: 50_000,
    },
    ModelInfo {
        id: "claude-4-sonnet",
        name: "Claude 4 Sonnet",
        provider: Provider::Anthropic,
        api_model: "claude-sonnet-4-20250514",
        context_window: 200_000,
        default_max_tokens: 50_000,
    },
    ModelInfo {
        id: "claude-4-opus",
        name: "Claude 4 Opus",
        provider: Provider::Anthropic,
        api_model: "claude-opus-4-20250514",
        context_window: 200_000,
        default_max_tokens: 32_000,
    },
];

/// All entries for one provider.
pub fn models_for(provider: Provider) -> &'static [ModelInfo] {
    match provider {
        Provider::Gemini => GEMINI_MODELS,
        Provider::OpenAi => OPENAI_MODELS,
        Provider::Anthropic => ANTHROPIC_MODELS,
    }
}

/// Look up a catalog entry by short id across every provider.
pub fn find(id: &str) -> Option<&'static ModelInfo> {
    [GEMINI_MODELS, OPENAI_MODELS, ANTHROPIC_MODELS]
        .into_iter()
        .flatten()
        .find(|m| m.id == id)
}

/// Resolve a configured model name to its wire string. Names not in
/// the catalog pass through unchanged so new models work immediately.
pub fn resolve_api_model(id: &str) -> &str {
    match find(id) {
        Some(info) => info.api_model,
        None => id,
    }
}
