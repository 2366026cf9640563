//! Error types for provider operations.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a provider.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure (connection refused, DNS, TLS, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The backend rejected the credential.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The backend is throttling requests.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider has no backend support for the requested capability.
    #[error("provider '{provider}' does not support {capability}")]
    UnsupportedCapability {
        provider: String,
        capability: &'static str,
    },

    /// Provider API error (any other non-success status or error payload).
    #[error("provider API error: {0}")]
    ProviderApi(String),

    /// Embedding response was incomplete or unusable for scoring.
    #[error("invalid embedding: {0}")]
    InvalidEmbedding(String),

    /// Provider not known to the registry.
    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    /// Credentials not found for provider.
    #[error("credentials not found for provider: {0}")]
    CredentialsNotFound(String),

    /// Response body did not have the expected shape.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the caller may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::RateLimited(_))
    }

    /// Map a `reqwest` transport error.
    pub(crate) fn network(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }

    /// Map a non-success HTTP status and its body to the error taxonomy.
    pub(crate) fn from_status(provider: &str, status: reqwest::StatusCode, body: &str) -> Self {
        let detail = if body.is_empty() {
            format!("{provider} returned {status}")
        } else {
            format!("{provider} returned {status}: {body}")
        };
        match status.as_u16() {
            401 | 403 => Error::Auth(detail),
            429 => Error::RateLimited(detail),
            _ => Error::ProviderApi(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats_correctly() {
        let err = Error::ProviderNotFound("gemini".to_string());
        assert_eq!(err.to_string(), "provider not found: gemini");

        let err = Error::UnsupportedCapability {
            provider: "anthropic".to_string(),
            capability: "embeddings",
        };
        assert_eq!(
            err.to_string(),
            "provider 'anthropic' does not support embeddings"
        );
    }

    #[test]
    fn error_from_serde_json() {
        let json_err: serde_json::Error = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn status_codes_map_to_taxonomy() {
        use reqwest::StatusCode;

        let err = Error::from_status("openai", StatusCode::UNAUTHORIZED, "bad key");
        assert!(matches!(err, Error::Auth(_)));
        assert!(err.to_string().contains("bad key"));

        let err = Error::from_status("openai", StatusCode::FORBIDDEN, "");
        assert!(matches!(err, Error::Auth(_)));

        let err = Error::from_status("openai", StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, Error::RateLimited(_)));
        assert!(err.is_retryable());

        let err = Error::from_status("openai", StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, Error::ProviderApi(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(Error::Network("reset".into()).is_retryable());
        assert!(!Error::Auth("nope".into()).is_retryable());
        assert!(!Error::InvalidEmbedding("short".into()).is_retryable());
    }
}
