//! OpenAI-compatible provider.
//!
//! Talks to the chat completions and embeddings endpoints. Any backend that
//! mirrors the OpenAI wire format (LM Studio, vLLM, Mistral, Groq) works by
//! pointing `base_url` at it.
//!
//! # Example
//!
//! ```ignore
//! use quizgen_models::auth::ApiKey;
//! use quizgen_models::providers::{ModelSelection, OpenAiProvider};
//!
//! let provider = OpenAiProvider::new(ModelSelection::new("gpt-4o-mini"))
//!     .with_api_key(ApiKey::new("sk-..."));
//! let local = OpenAiProvider::new(ModelSelection::new("qwen2.5"))
//!     .with_base_url("http://localhost:1234/v1");
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    ChatRequest, ChatResponse, EmbedRequest, EmbedResponse, ModelProvider, ModelSelection,
    ResponseFormat, StopReason, Usage, read_json,
};
use crate::auth::ApiKey;
use crate::{Capabilities, Error, Result};

/// Default OpenAI API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

// ────────────────────────────────────────────────────────────────────────────
// OpenAI API Types
// ────────────────────────────────────────────────────────────────────────────

/// Message in an OpenAI chat request/response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// `response_format` object for JSON mode.
#[derive(Debug, Serialize)]
pub struct OpenAiResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Request body for `/chat/completions`.
#[derive(Debug, Serialize)]
pub struct OpenAiChatRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<OpenAiResponseFormat>,
}

impl From<ChatRequest> for OpenAiChatRequest {
    fn from(request: ChatRequest) -> Self {
        Self {
            model: request.model,
            messages: request
                .messages
                .into_iter()
                .map(|m| OpenAiMessage {
                    role: m.role.as_str().to_string(),
                    content: Some(m.content),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: match request.response_format {
                Some(ResponseFormat::JsonObject) => Some(OpenAiResponseFormat {
                    kind: "json_object",
                }),
                None => None,
            },
        }
    }
}

/// One completion choice.
#[derive(Debug, Deserialize)]
pub struct OpenAiChoice {
    pub message: OpenAiMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token counts reported by OpenAI.
#[derive(Debug, Default, Deserialize)]
pub struct OpenAiUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

/// Response from `/chat/completions`.
#[derive(Debug, Deserialize)]
pub struct OpenAiChatResponse {
    pub choices: Vec<OpenAiChoice>,
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

impl TryFrom<OpenAiChatResponse> for ChatResponse {
    type Error = Error;

    fn try_from(response: OpenAiChatResponse) -> Result<Self> {
        let usage = response.usage.unwrap_or_default();
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::ProviderApi("OpenAI returned no choices".to_string()))?;

        Ok(Self {
            content: choice.message.content.unwrap_or_default(),
            stop_reason: stop_reason_from_finish(choice.finish_reason.as_deref()),
            usage: Usage::new(usage.prompt_tokens, usage.completion_tokens),
        })
    }
}

/// Map an OpenAI `finish_reason` onto [`StopReason`].
fn stop_reason_from_finish(reason: Option<&str>) -> StopReason {
    match reason {
        Some("length") => StopReason::MaxTokens,
        _ => StopReason::EndTurn,
    }
}

/// Request body for `/embeddings`.
#[derive(Debug, Serialize)]
pub struct OpenAiEmbedRequest {
    pub model: String,
    pub input: Vec<String>,
}

/// One embedding in an `/embeddings` response.
#[derive(Debug, Deserialize)]
pub struct OpenAiEmbedding {
    pub embedding: Vec<f32>,
    pub index: usize,
}

/// Response from `/embeddings`.
#[derive(Debug, Deserialize)]
pub struct OpenAiEmbedResponse {
    pub data: Vec<OpenAiEmbedding>,
    #[serde(default)]
    pub usage: Option<OpenAiUsage>,
}

impl From<OpenAiEmbedResponse> for EmbedResponse {
    fn from(mut response: OpenAiEmbedResponse) -> Self {
        response.data.sort_by_key(|e| e.index);
        let usage = response.usage.unwrap_or_default();
        Self {
            embeddings: response.data.into_iter().map(|e| e.embedding).collect(),
            usage: Usage::new(usage.prompt_tokens, 0),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAiProvider
// ────────────────────────────────────────────────────────────────────────────

/// OpenAI-compatible provider with chat, JSON mode and embeddings.
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<ApiKey>,
    client: reqwest::Client,
    selection: ModelSelection,
}

impl OpenAiProvider {
    /// Create a provider against the public OpenAI API.
    pub fn new(selection: ModelSelection) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            client: reqwest::Client::new(),
            selection,
        }
    }

    /// Use a custom base URL (without trailing `/chat/completions`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the bearer token.
    pub fn with_api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
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

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, path);
        let mut builder = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(Error::network)?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status("OpenAI", status, &body));
        }
        Ok(response)
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full()
    }

    fn selection(&self) -> &ModelSelection {
        &self.selection
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let body = OpenAiChatRequest::from(request);
        let response = self.post("chat/completions", &body).await?;
        let response: OpenAiChatResponse = read_json(response).await?;
        response.try_into()
    }

    async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse> {
        let body = OpenAiEmbedRequest {
            model: request.model,
            input: request.texts,
        };
        let response = self.post("embeddings", &body).await?;
        let response: OpenAiEmbedResponse = read_json(response).await?;
        Ok(response.into())
    }
}
