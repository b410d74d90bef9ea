//! Error types for the geocoding stack.
//!
//! The cache never surfaces these to its callers; they exist so the provider
//! client can report what went wrong and the cache can log it before applying
//! the fallback location.

use thiserror::Error;

/// Result type alias using `LocatorError`.
pub type Result<T> = std::result::Result<T, LocatorError>;

/// Main error type for all locator operations.
#[derive(Debug, Error)]
pub enum LocatorError {
    // ═══════════════════════════════════════════════════════════════════════════
    // PROVIDER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// HTTP request to the provider failed (connect, TLS, body read).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Provider answered with a non-success status.
    #[error("Geocoding provider returned status {status}: {body}")]
    ProviderStatus { status: u16, body: String },

    /// Provider body was not the expected JSON array.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// A latitude or longitude string could not be parsed.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Connection timeout (only when a timeout is configured).
    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Input validation failed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A lookup task ended without producing a result.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LocatorError {
    /// Returns true if retrying the same request later could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            LocatorError::Http(_) | LocatorError::ConnectionTimeout(_) => true,
            LocatorError::ProviderStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns true if the error came from talking to the geocoding provider.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            LocatorError::Http(_)
                | LocatorError::ProviderStatus { .. }
                | LocatorError::MalformedResponse(_)
                | LocatorError::InvalidCoordinate(_)
                | LocatorError::ConnectionTimeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LocatorError::ProviderStatus {
            status: 503,
            body: "busy".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn test_error_classification() {
        assert!(LocatorError::Http("reset".into()).is_recoverable());
        assert!(LocatorError::ProviderStatus { status: 429, body: String::new() }.is_recoverable());
        assert!(!LocatorError::ProviderStatus { status: 403, body: String::new() }.is_recoverable());
        assert!(!LocatorError::MalformedResponse("x".into()).is_recoverable());

        assert!(LocatorError::InvalidCoordinate("abc".into()).is_provider_error());
        assert!(!LocatorError::ConfigError("x".into()).is_provider_error());
        assert!(!LocatorError::InternalError("task".into()).is_recoverable());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid");
        let result: Result<serde_json::Value> = json_result.map_err(LocatorError::from);
        assert!(matches!(result, Err(LocatorError::JsonError(_))));
    }
}
