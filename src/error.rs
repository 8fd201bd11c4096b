//! Scriptorium error types

use std::time::Duration;

/// Scriptorium error types
#[derive(Debug, thiserror::Error)]
pub enum ScriptoriumError {
    // Request errors
    #[error("unknown content type: {0}")]
    UnknownContentType(String),

    #[error("rate limit exceeded: {limit} requests per {window:?}")]
    RateLimitExceeded { limit: u64, window: Duration },

    /// Wraps any failure raised by a backend invocation, after the cache
    /// and rate-limit checks have passed.
    #[error("content generation failed: {0}")]
    GenerationFailed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("empty response from model")]
    EmptyResponse,

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Store errors
    #[error("cache store error: {0}")]
    Store(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for Scriptorium operations
pub type Result<T> = std::result::Result<T, ScriptoriumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_failed_keeps_cause_message() {
        let err = ScriptoriumError::GenerationFailed("HTTP error: connection reset".into());
        assert!(err.to_string().contains("connection reset"));
    }
}
