//! Error types for Shipmate
//!
//! Two layers: `ShipmateError` is the crate-wide error enum, and
//! `ProviderError` carries typed failures from the LLM transport so the
//! agent loop can map each kind to a specific user-facing message.

use thiserror::Error;

/// Main error type for Shipmate operations.
#[derive(Error, Debug)]
pub enum ShipmateError {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Typed LLM provider error
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Session management error
    #[error("Session error: {0}")]
    Session(String),

    /// IO error (file operations, persistence)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Typed errors from the LLM transport.
///
/// Each variant corresponds to a distinct failure class with a distinct
/// user-facing apology; see `agent::transport_apology`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Authentication failed (invalid or missing API key)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Request exceeded its time bound
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Could not reach the provider at all
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Provider-side server error (HTTP 5xx)
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Request was rejected as malformed (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Any other API-level error
    #[error("API error: {0}")]
    Api(String),
}

impl ProviderError {
    /// Whether a later retry of the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimit(_)
                | ProviderError::Timeout(_)
                | ProviderError::Connection(_)
                | ProviderError::ServerError { .. }
        )
    }

    /// HTTP status code associated with this error kind, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Auth(_) => Some(401),
            ProviderError::RateLimit(_) => Some(429),
            ProviderError::InvalidRequest(_) => Some(400),
            ProviderError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for Shipmate operations.
pub type Result<T> = std::result::Result<T, ShipmateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_retryable() {
        assert!(ProviderError::RateLimit("slow down".into()).is_retryable());
        assert!(ProviderError::Timeout("60s".into()).is_retryable());
        assert!(!ProviderError::Auth("bad key".into()).is_retryable());
        assert!(!ProviderError::InvalidRequest("bad body".into()).is_retryable());
    }

    #[test]
    fn provider_error_status_codes() {
        assert_eq!(ProviderError::Auth("x".into()).status_code(), Some(401));
        assert_eq!(ProviderError::RateLimit("x".into()).status_code(), Some(429));
        assert_eq!(
            ProviderError::ServerError { status: 529, message: "overloaded".into() }.status_code(),
            Some(529)
        );
        assert_eq!(ProviderError::Connection("x".into()).status_code(), None);
    }

    #[test]
    fn shipmate_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ShipmateError = io.into();
        assert!(err.to_string().contains("IO error"));
    }
}
