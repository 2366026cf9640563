//! Provider selection from configuration.
//!
//! [`build_provider`] turns a resolved [`ProviderConfig`] into a boxed
//! [`ModelProvider`], filling per-backend model defaults and resolving the API
//! key. Callers never name a concrete adapter type.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::auth::{ApiKey, resolve_api_key};
use crate::providers::{
    AnthropicProvider, ModelProvider, ModelSelection, OllamaProvider, OpenAiProvider,
};
use crate::{Error, Result};

/// Supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI or any OpenAI-compatible endpoint.
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
    /// Local Ollama server.
    Ollama,
}

impl ProviderKind {
    /// Registry name of this backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Generation model used when none is configured.
    pub fn default_generation_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-5-haiku-latest",
            ProviderKind::Ollama => "llama3",
        }
    }

    /// Embedding model used when none is configured, if the backend has one.
    pub fn default_embedding_model(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("text-embedding-3-small"),
            ProviderKind::Anthropic => None,
            ProviderKind::Ollama => Some("nomic-embed-text"),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(Error::ProviderNotFound(other.to_string())),
        }
    }
}

/// Resolved provider configuration handed in by the host.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Which backend to use.
    pub provider: ProviderKind,
    /// Override the backend's base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key; falls back to the provider's environment variable.
    #[serde(default)]
    pub api_key: Option<ApiKey>,
    /// Model for quiz generation.
    #[serde(default)]
    pub generation_model: Option<String>,
    /// Model for answer similarity scoring.
    #[serde(default)]
    pub embedding_model: Option<String>,
    /// Output token limit for generation.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Sampling temperature for generation.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Per-request transport timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    /// Configuration for a backend with every optional field unset.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            base_url: None,
            api_key: None,
            generation_model: None,
            embedding_model: None,
            max_tokens: None,
            temperature: None,
            timeout_secs: None,
        }
    }

    /// Model names and sampling settings with backend defaults applied.
    pub fn selection(&self) -> ModelSelection {
        ModelSelection {
            generation_model: self
                .generation_model
                .clone()
                .unwrap_or_else(|| self.provider.default_generation_model().to_string()),
            embedding_model: self
                .embedding_model
                .clone()
                .or_else(|| self.provider.default_embedding_model().map(str::to_string)),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))
    }
}

/// Build the adapter selected by `config`.
///
/// # Errors
///
/// Returns `Error::CredentialsNotFound` when a cloud backend has no API key in
/// the configuration or environment. OpenAI-compatible endpoints with a custom
/// `base_url` may run without a key.
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn ModelProvider>> {
    let selection = config.selection();
    let client = config.http_client()?;
    debug!(
        provider = %config.provider,
        model = %selection.generation_model,
        "building provider"
    );

    let provider: Arc<dyn ModelProvider> = match config.provider {
        ProviderKind::OpenAi => {
            let mut provider = OpenAiProvider::new(selection).with_client(client);
            match &config.base_url {
                Some(url) => {
                    provider = provider.with_base_url(url);
                    if let Ok(key) = resolve_api_key("openai", config.api_key.clone()) {
                        provider = provider.with_api_key(key);
                    }
                }
                None => {
                    provider =
                        provider.with_api_key(resolve_api_key("openai", config.api_key.clone())?);
                }
            }
            Arc::new(provider)
        }
        ProviderKind::Anthropic => {
            let key = resolve_api_key("anthropic", config.api_key.clone())?;
            let mut provider = AnthropicProvider::new(key, selection).with_client(client);
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
        ProviderKind::Ollama => {
            let mut provider = OllamaProvider::new(selection).with_client(client);
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
    };

    Ok(provider)
}
