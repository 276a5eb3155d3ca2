//! Provider error types for tabula-llm.
//!
//! All provider operations return [`Result<T>`] which uses [`ProviderError`]
//! as the error type. Variants fall into two groups:
//!
//! - construction failures raised by [`Provider::initialize`](crate::Provider::initialize)
//!   (`NotConfigured`, `Unreachable`, `UnsupportedProvider`)
//! - generation failures raised by [`Provider::complete`](crate::Provider::complete)
//!   (everything else)

use thiserror::Error;

/// Errors that can occur when interacting with an LLM backend.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A required credential is missing or still a placeholder.
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// A local-endpoint backend could not be reached during setup.
    #[error("cannot reach {endpoint}: {reason}")]
    Unreachable {
        /// The endpoint that was probed.
        endpoint: String,
        /// Why the probe failed.
        reason: String,
    },

    /// The provider identifier is not one of the supported backends.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The adapter was used before a successful `initialize`, or after a failed one.
    #[error("provider is not ready: {0}")]
    NotReady(String),

    /// The HTTP request to the provider failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Authentication with the provider was rejected (HTTP 401/403).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The provider returned a rate-limit response (HTTP 429).
    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested wait time before retrying, in milliseconds.
        retry_after_ms: u64,
    },

    /// The requested model does not exist on the provider.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The provider returned a response that could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The provider answered successfully but produced no text.
    #[error("empty response from {0}")]
    EmptyResponse(String),

    /// The request timed out.
    #[error("timeout")]
    Timeout,

    /// An HTTP-level error from reqwest.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ProviderError {
    /// Whether this error happened while generating a response, as opposed
    /// to while building or initializing a provider.
    pub fn is_generation_error(&self) -> bool {
        !matches!(
            self,
            ProviderError::NotConfigured(_)
                | ProviderError::Unreachable { .. }
                | ProviderError::UnsupportedProvider(_)
        )
    }
}

/// A convenience type alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_not_configured() {
        let err = ProviderError::NotConfigured("set OPENAI_API_KEY env var".into());
        assert_eq!(
            err.to_string(),
            "provider not configured: set OPENAI_API_KEY env var"
        );
    }

    #[test]
    fn display_unreachable() {
        let err = ProviderError::Unreachable {
            endpoint: "http://localhost:11434".into(),
            reason: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot reach http://localhost:11434: connection refused"
        );
    }

    #[test]
    fn display_unsupported_provider() {
        let err = ProviderError::UnsupportedProvider("mistral".into());
        assert_eq!(err.to_string(), "unsupported provider: mistral");
    }

    #[test]
    fn display_auth_failed() {
        let err = ProviderError::AuthFailed("invalid token".into());
        assert_eq!(err.to_string(), "authentication failed: invalid token");
    }

    #[test]
    fn display_rate_limited() {
        let err = ProviderError::RateLimited {
            retry_after_ms: 5000,
        };
        assert_eq!(err.to_string(), "rate limited: retry after 5000ms");
    }

    #[test]
    fn display_empty_response() {
        let err = ProviderError::EmptyResponse("gemini".into());
        assert_eq!(err.to_string(), "empty response from gemini");
    }

    #[test]
    fn display_timeout() {
        assert_eq!(ProviderError::Timeout.to_string(), "timeout");
    }

    #[test]
    fn json_error_from_conversion() {
        let bad_json = serde_json::from_str::<serde_json::Value>("not json");
        let provider_err: ProviderError = bad_json.unwrap_err().into();
        assert!(provider_err.to_string().starts_with("json error:"));
    }

    #[test]
    fn construction_errors_are_not_generation_errors() {
        assert!(!ProviderError::NotConfigured("x".into()).is_generation_error());
        assert!(
            !ProviderError::Unreachable {
                endpoint: "e".into(),
                reason: "r".into()
            }
            .is_generation_error()
        );
        assert!(!ProviderError::UnsupportedProvider("x".into()).is_generation_error());
    }

    #[test]
    fn transport_errors_are_generation_errors() {
        assert!(ProviderError::RequestFailed("x".into()).is_generation_error());
        assert!(ProviderError::AuthFailed("x".into()).is_generation_error());
        assert!(ProviderError::Timeout.is_generation_error());
        assert!(ProviderError::EmptyResponse("x".into()).is_generation_error());
        assert!(ProviderError::NotReady("x".into()).is_generation_error());
    }
}
