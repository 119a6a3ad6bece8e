//! Error types for the Harvest evaluator
//!
//! Translation, validation and execution failures share one enum so the
//! dispatch boundary can classify them without downcasting.

use thiserror::Error;

/// Message carried by [`Error::InvalidRange`].
pub const INVALID_RANGE: &str = "invalid range";

/// The main error type for evaluator operations
#[derive(Error, Debug)]
pub enum Error {
    // ========== Translation Errors ==========
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    #[error("Invalid range")]
    InvalidRange,

    // ========== Engine Errors ==========
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Execution error: {0}")]
    Execution(String),

    // ========== IO Errors ==========
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========== Configuration Errors ==========
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for evaluator operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if the client supplied an expression that cannot be
    /// evaluated. These all surface as the same unprocessable-entity shape.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedExpression(_) | Error::InvalidRange | Error::Validation(_)
        )
    }

    /// Bare message without the kind prefix, as reported to clients
    pub fn message(&self) -> String {
        match self {
            Error::MalformedExpression(msg)
            | Error::Validation(msg)
            | Error::Execution(msg)
            | Error::Configuration(msg) => msg.clone(),
            Error::InvalidRange => INVALID_RANGE.to_string(),
            Error::Io(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Validation("unknown concept \"x\"".to_string());
        assert_eq!(err.to_string(), "Validation error: unknown concept \"x\"");
    }

    #[test]
    fn test_invalid_range_message() {
        assert_eq!(Error::InvalidRange.message(), "invalid range");
    }

    #[test]
    fn test_message_strips_prefix() {
        let err = Error::MalformedExpression("missing field `type`".to_string());
        assert_eq!(err.message(), "missing field `type`");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::InvalidRange.is_client_error());
        assert!(Error::MalformedExpression("x".to_string()).is_client_error());
        assert!(Error::Validation("x".to_string()).is_client_error());
        assert!(!Error::Execution("x".to_string()).is_client_error());
    }
}
