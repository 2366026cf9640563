//! Error types for quizgen-core

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for quizgen-core
#[derive(Error, Debug)]
pub enum Error {
    /// Adapter failure, propagated unchanged.
    #[error(transparent)]
    Provider(#[from] quizgen_models::Error),

    /// The provider answered, but no usable question could be parsed.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The generation config requests zero questions.
    #[error("Generation config requests no questions")]
    EmptyRequest,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the underlying failure is transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Provider(e) if e.is_retryable())
    }
}
