//! Core types for provider selection.

use serde::{Deserialize, Serialize};

/// Provider capabilities indicating what the backend supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Supports chat/completion generation.
    pub chat: bool,
    /// Honors a JSON-object response format hint.
    pub json_mode: bool,
    /// Supports text embeddings.
    pub embeddings: bool,
}

impl Capabilities {
    /// Create capabilities for a chat-only backend.
    pub fn chat() -> Self {
        Self {
            chat: true,
            ..Default::default()
        }
    }

    /// Create capabilities for a backend with chat, JSON mode and embeddings.
    pub fn full() -> Self {
        Self {
            chat: true,
            json_mode: true,
            embeddings: true,
        }
    }

    /// Enable JSON mode.
    pub fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }

}
