//! Ollama local model provider.
//!
//! Connects to a local Ollama instance for running models like Llama, Mistral, etc.
//!
//! # Example
//!
//! ```ignore
//! use quizgen_models::providers::{ModelSelection, OllamaProvider};
//!
//! let selection = ModelSelection::new("llama3").embedding_model("nomic-embed-text");
//! let provider = OllamaProvider::new(selection.clone());  // Uses localhost:11434
//! let provider = OllamaProvider::new(selection).with_base_url("http://192.168.1.100:11434");
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    ChatRequest, ChatResponse, EmbedRequest, EmbedResponse, ModelProvider, ModelSelection,
    ResponseFormat, StopReason, Usage, read_json,
};
use crate::{Capabilities, Error, Result};

/// Default Ollama API base URL.
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

// ────────────────────────────────────────────────────────────────────────────
// Ollama API Types
// ────────────────────────────────────────────────────────────────────────────

/// Message in an Ollama chat request/response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OllamaChatMessage {
    pub role: String,
    pub content: String,
}

/// Request body for Ollama's `/api/chat` endpoint.
#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaChatOptions>,
}

/// Chat options for Ollama.
#[derive(Debug, Serialize)]
pub struct OllamaChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
}

impl From<ChatRequest> for OllamaChatRequest {
    fn from(request: ChatRequest) -> Self {
        let messages = request
            .messages
            .into_iter()
            .map(|m| OllamaChatMessage {
                role: m.role.as_str().to_string(),
                content: m.content,
            })
            .collect();

        let options = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(OllamaChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            })
        } else {
            None
        };

        Self {
            model: request.model,
            messages,
            stream: false,
            format: match request.response_format {
                Some(ResponseFormat::JsonObject) => Some("json"),
                None => None,
            },
            options,
        }
    }
}

/// Response from Ollama's `/api/chat` endpoint.
#[derive(Debug, Deserialize)]
pub struct OllamaChatResponse {
    pub model: String,
    pub message: OllamaChatMessage,
    pub done: bool,
    #[serde(default)]
    pub done_reason: Option<String>,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl From<OllamaChatResponse> for ChatResponse {
    fn from(response: OllamaChatResponse) -> Self {
        let stop_reason = match response.done_reason.as_deref() {
            Some("length") => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        };
        Self {
            content: response.message.content,
            stop_reason,
            usage: Usage::new(
                response.prompt_eval_count.unwrap_or(0),
                response.eval_count.unwrap_or(0),
            ),
        }
    }
}

/// Request body for Ollama's `/api/embed` endpoint.
#[derive(Debug, Serialize)]
pub struct OllamaEmbedRequest {
    pub model: String,
    pub input: Vec<String>,
}

/// Response from Ollama's `/api/embed` endpoint.
#[derive(Debug, Deserialize)]
pub struct OllamaEmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
}

impl From<OllamaEmbedResponse> for EmbedResponse {
    fn from(response: OllamaEmbedResponse) -> Self {
        Self {
            embeddings: response.embeddings,
            usage: Usage::new(response.prompt_eval_count.unwrap_or(0), 0),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OllamaProvider
// ────────────────────────────────────────────────────────────────────────────

/// Ollama local model provider.
///
/// Connects to a local Ollama instance to run models like Llama, Mistral, etc.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
    selection: ModelSelection,
}

impl OllamaProvider {
    /// Create a new Ollama provider with default URL (localhost:11434).
    pub fn new(selection: ModelSelection) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            selection,
        }
    }

    /// Use a custom base URL.
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

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(Error::network)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status("Ollama", status, &body));
        }
        Ok(response)
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full()
    }

    fn selection(&self) -> &ModelSelection {
        &self.selection
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let body = OllamaChatRequest::from(request);
        let response = self.post("api/chat", &body).await?;
        let response: OllamaChatResponse = read_json(response).await?;
        Ok(response.into())
    }

    async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse> {
        let body = OllamaEmbedRequest {
            model: request.model,
            input: request.texts,
        };
        let response = self.post("api/embed", &body).await?;
        let response: OllamaEmbedResponse = read_json(response).await?;
        Ok(response.into())
    }
}
