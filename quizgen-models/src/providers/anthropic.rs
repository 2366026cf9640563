//! Anthropic Messages API provider.
//!
//! Chat only: Anthropic offers no embeddings endpoint, so similarity scoring
//! through this adapter fails with [`Error::UnsupportedCapability`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    ChatRequest, ChatResponse, ModelProvider, ModelSelection, Role, StopReason, Usage, read_json,
};
use crate::auth::ApiKey;
use crate::{Capabilities, Error, Result};

/// Default Anthropic API base URL.
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// API version header value.
const API_VERSION: &str = "2023-06-01";

/// `max_tokens` is mandatory for the Messages API.
const DEFAULT_MAX_TOKENS: u32 = 4096;

// ────────────────────────────────────────────────────────────────────────────
// Anthropic API Types
// ────────────────────────────────────────────────────────────────────────────

/// Message in an Anthropic request.
#[derive(Debug, Clone, Serialize)]
pub struct AnthropicMessage {
    pub role: &'static str,
    pub content: String,
}

/// Request body for `/v1/messages`.
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl From<ChatRequest> for AnthropicRequest {
    fn from(request: ChatRequest) -> Self {
        // System prompts travel in their own field, not as a message.
        let system = request.system_text();
        let messages = request
            .messages
            .into_iter()
            .filter(|m| m.role != Role::System)
            .map(|m| AnthropicMessage {
                role: m.role.as_str(),
                content: m.content,
            })
            .collect();

        Self {
            model: request.model,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            messages,
            temperature: request.temperature,
        }
    }
}

/// One content block in a response.
#[derive(Debug, Deserialize)]
pub struct AnthropicContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Token counts reported by Anthropic.
#[derive(Debug, Default, Deserialize)]
pub struct AnthropicUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Response from `/v1/messages`.
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    pub content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: AnthropicUsage,
}

impl From<AnthropicResponse> for ChatResponse {
    fn from(response: AnthropicResponse) -> Self {
        let content = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let stop_reason = match response.stop_reason.as_deref() {
            Some("max_tokens") => StopReason::MaxTokens,
            Some("stop_sequence") => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        };

        Self {
            content,
            stop_reason,
            usage: Usage::new(response.usage.input_tokens, response.usage.output_tokens),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AnthropicProvider
// ────────────────────────────────────────────────────────────────────────────

/// Anthropic provider.
pub struct AnthropicProvider {
    base_url: String,
    api_key: ApiKey,
    client: reqwest::Client,
    selection: ModelSelection,
}

impl AnthropicProvider {
    /// Create a provider against the public Anthropic API.
    pub fn new(api_key: ApiKey, selection: ModelSelection) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            client: reqwest::Client::new(),
            selection,
        }
    }

    /// Use a custom base URL (without trailing `/v1/messages`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Get the base URL for this provider.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::chat()
    }

    fn selection(&self) -> &ModelSelection {
        &self.selection
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = AnthropicRequest::from(request);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(Error::network)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status("Anthropic", status, &body));
        }

        let response: AnthropicResponse = read_json(response).await?;
        Ok(response.into())
    }
}
