//! Model provider trait and implementations.
//!
//! The [`ModelProvider`] trait defines the uniform adapter contract for every
//! backend, whether cloud-based (OpenAI, Anthropic) or local (Ollama). Each
//! adapter implements the raw `chat` and `embed` calls; the quiz-facing
//! capabilities [`generate_quiz`](ModelProvider::generate_quiz) and
//! [`score_similarity`](ModelProvider::score_similarity) are built on top of
//! them, so no backend-specific type leaks past this boundary.
//!
//! # Example
//!
//! ```ignore
//! use quizgen_models::providers::{ModelProvider, QuizPrompt};
//!
//! async fn run(provider: &dyn ModelProvider) -> quizgen_models::Result<()> {
//!     let prompt = QuizPrompt::new("Return JSON.", "Material: ...");
//!     let generation = provider.generate_quiz(&prompt).await?;
//!     if generation.truncated {
//!         eprintln!("output was cut off");
//!     }
//!     let score = provider.score_similarity("a cat", "a kitten").await?;
//!     println!("{} / {score}", generation.text);
//!     Ok(())
//! }
//! ```

mod anthropic;
mod ollama;
mod openai;
mod types;

use async_trait::async_trait;
use tracing::{debug, warn};

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use types::*;

use crate::{Capabilities, Error, Result, cosine_similarity};

/// Decode a successful response body, keeping the raw text for the error.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T> {
    let body = response.text().await.map_err(Error::network)?;
    Ok(serde_json::from_str(&body)?)
}

/// Trait for model providers (cloud and local).
///
/// # Required Methods
///
/// - [`name`](ModelProvider::name) - Provider identifier (e.g., "openai", "ollama")
/// - [`capabilities`](ModelProvider::capabilities) - What the backend supports
/// - [`selection`](ModelProvider::selection) - Models and sampling settings in use
/// - [`chat`](ModelProvider::chat) - Non-streaming chat completion
///
/// # Optional Methods
///
/// - [`embed`](ModelProvider::embed) - Text embeddings (returns
///   [`Error::UnsupportedCapability`] by default)
///
/// # Provided Methods
///
/// - [`generate_quiz`](ModelProvider::generate_quiz)
/// - [`score_similarity`](ModelProvider::score_similarity)
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Returns the provider name (e.g., "openai", "anthropic", "ollama").
    fn name(&self) -> &str;

    /// Returns what this backend supports.
    fn capabilities(&self) -> Capabilities;

    /// Returns the models and sampling settings this adapter was built with.
    fn selection(&self) -> &ModelSelection;

    /// Perform a chat completion request.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Generate text embeddings.
    ///
    /// # Default Implementation
    ///
    /// Returns [`Error::UnsupportedCapability`].
    async fn embed(&self, _request: EmbedRequest) -> Result<EmbedResponse> {
        Err(Error::UnsupportedCapability {
            provider: self.name().to_string(),
            capability: "embeddings",
        })
    }

    /// Produce raw quiz text from a prompt pair.
    ///
    /// A length-limited response is not an error: the possibly invalid text is
    /// returned with [`Generation::truncated`] set so the caller can attempt
    /// best-effort parsing and warn the user.
    async fn generate_quiz(&self, prompt: &QuizPrompt) -> Result<Generation> {
        let selection = self.selection();
        let mut request = ChatRequest::new(
            selection.generation_model.clone(),
            vec![
                Message::system(prompt.system.clone()),
                Message::user(prompt.user.clone()),
            ],
        );
        if self.capabilities().json_mode {
            request = request.json_object();
        }
        if let Some(tokens) = selection.max_tokens {
            request = request.max_tokens(tokens);
        }
        if let Some(temp) = selection.temperature {
            request = request.temperature(temp);
        }

        debug!(
            provider = self.name(),
            model = %request.model,
            "requesting quiz generation"
        );
        let response = self.chat(request).await?;
        let truncated = response.is_truncated();
        if truncated {
            warn!(
                provider = self.name(),
                output_tokens = response.usage.output_tokens,
                "quiz generation stopped at the output token limit"
            );
        }

        Ok(Generation {
            text: response.content,
            truncated,
        })
    }

    /// Score the semantic similarity of two strings in [-1, 1].
    ///
    /// Both strings are embedded in one request and compared with
    /// [`cosine_similarity`]. A response without exactly two equal-length,
    /// non-zero vectors is an error.
    async fn score_similarity(&self, a: &str, b: &str) -> Result<f32> {
        let unsupported = || Error::UnsupportedCapability {
            provider: self.name().to_string(),
            capability: "embeddings",
        };
        if !self.capabilities().embeddings {
            return Err(unsupported());
        }
        let model = self
            .selection()
            .embedding_model
            .clone()
            .ok_or_else(unsupported)?;

        debug!(provider = self.name(), model = %model, "requesting embeddings");
        let response = self
            .embed(EmbedRequest::new(model, vec![a.to_string(), b.to_string()]))
            .await?;

        match response.embeddings.as_slice() {
            [first, second] => cosine_similarity(first, second),
            other => Err(Error::InvalidEmbedding(format!(
                "expected 2 embeddings, got {}",
                other.len()
            ))),
        }
    }
}
