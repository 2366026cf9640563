//! Provider adapters for quizgen.
//!
//! This crate provides:
//! - A provider trait giving every backend the same two capabilities:
//!   quiz text generation and semantic similarity scoring
//! - Adapters for OpenAI-compatible, Anthropic, and Ollama backends
//! - A registry that selects an adapter from configuration
//! - API key handling that keeps secrets out of logs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              registry::build_provider                │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  │
//! │  │   OpenAI    │  │  Anthropic  │  │   Ollama    │  │
//! │  │  Provider   │  │  Provider   │  │  Provider   │  │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │   ModelProvider::generate_quiz / score_similarity    │
//! └─────────────────────────────────────────────────────┘
//! ```

mod error;
mod similarity;
mod types;

pub mod auth;
pub mod providers;
pub mod registry;

pub use error::{Error, Result};
pub use registry::{ProviderConfig, ProviderKind, build_provider};
pub use similarity::cosine_similarity;
pub use types::Capabilities;
