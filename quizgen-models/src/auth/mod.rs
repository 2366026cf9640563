//! API key handling.
//!
//! Keys come from the resolved provider configuration, falling back to the
//! provider's conventional environment variable for CI/deployment scenarios.
//!
//! # Example
//!
//! ```ignore
//! use quizgen_models::auth::{ApiKey, resolve_api_key};
//!
//! // Explicit key from configuration wins
//! let key = resolve_api_key("openai", Some(ApiKey::new("sk-...")))?;
//!
//! // Otherwise OPENAI_API_KEY is consulted
//! let key = resolve_api_key("openai", None)?;
//! ```

use std::env;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::{Error, Result};

/// A secure API key that prevents accidental logging.
///
/// The key is wrapped in `SecretString` which:
/// - Implements `Debug` as `"[REDACTED]"`
/// - Zeroizes memory on drop
/// - Requires explicit `.expose_secret()` to access the value
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Create a new API key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Expose the secret key value.
    ///
    /// Use sparingly - only when actually sending to an API.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for ApiKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(ApiKey::new)
    }
}

/// Environment variable names for each provider.
const ENV_VARS: &[(&str, &str)] = &[
    ("anthropic", "ANTHROPIC_API_KEY"),
    ("openai", "OPENAI_API_KEY"),
];

/// Get the environment variable name for a provider.
pub fn env_var_for_provider(provider: &str) -> Option<&'static str> {
    ENV_VARS
        .iter()
        .find(|(p, _)| *p == provider)
        .map(|(_, v)| *v)
}

/// Resolve the API key for a provider.
///
/// An explicitly configured key wins; otherwise the provider's environment
/// variable is read.
///
/// # Errors
///
/// Returns `Error::CredentialsNotFound` if neither source has a non-empty key.
pub fn resolve_api_key(provider: &str, configured: Option<ApiKey>) -> Result<ApiKey> {
    resolve_with(provider, configured, |name| env::var(name).ok())
}

fn resolve_with(
    provider: &str,
    configured: Option<ApiKey>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ApiKey> {
    if let Some(key) = configured.filter(|k| !k.expose_secret().trim().is_empty()) {
        debug!(provider, "using API key from configuration");
        return Ok(key);
    }

    if let Some(value) = env_var_for_provider(provider)
        .and_then(&lookup)
        .filter(|v| !v.trim().is_empty())
    {
        debug!(provider, "using API key from environment");
        return Ok(ApiKey::new(value));
    }

    Err(Error::CredentialsNotFound(provider.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-secret-key-12345");
        let debug = format!("{:?}", key);
        assert_eq!(debug, "ApiKey([REDACTED])");
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn api_key_expose_secret_returns_value() {
        let key = ApiKey::new("sk-secret-key-12345");
        assert_eq!(key.expose_secret(), "sk-secret-key-12345");
    }

    #[test]
    fn api_key_deserializes_from_string() {
        let key: ApiKey = serde_json::from_str("\"sk-from-config\"").unwrap();
        assert_eq!(key.expose_secret(), "sk-from-config");
    }

    #[test]
    fn env_var_for_known_providers() {
        assert_eq!(env_var_for_provider("anthropic"), Some("ANTHROPIC_API_KEY"));
        assert_eq!(env_var_for_provider("openai"), Some("OPENAI_API_KEY"));
        assert_eq!(env_var_for_provider("ollama"), None);
    }

    #[test]
    fn configured_key_wins_over_environment() {
        let key = resolve_with("openai", Some(ApiKey::new("from-config")), |_| {
            Some("from-env".to_string())
        })
        .unwrap();
        assert_eq!(key.expose_secret(), "from-config");
    }

    #[test]
    fn environment_is_used_when_not_configured() {
        let key = resolve_with("anthropic", None, |name| {
            assert_eq!(name, "ANTHROPIC_API_KEY");
            Some("from-env".to_string())
        })
        .unwrap();
        assert_eq!(key.expose_secret(), "from-env");
    }

    #[test]
    fn blank_keys_are_treated_as_missing() {
        let result = resolve_with("openai", Some(ApiKey::new("  ")), |_| Some(String::new()));
        assert!(matches!(result, Err(Error::CredentialsNotFound(_))));
    }

    #[test]
    fn unknown_provider_without_key_fails() {
        let result = resolve_with("unknown", None, |_| Some("x".to_string()));
        assert!(matches!(result, Err(Error::CredentialsNotFound(p)) if p == "unknown"));
    }
}
