//! Error types for namewatch
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for namewatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for namewatch
#[derive(Error, Debug)]
pub enum Error {
    /// Upstream lookup service reported a failure
    #[error("Lookup error ({service}): {message}")]
    Lookup {
        /// Service name (history, availability, bedrock)
        service: String,
        /// Error message
        message: String,
    },

    /// Transport-level failure (timeout, refused connection, DNS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream answered with a status the lookup does not understand
    #[error("Unexpected HTTP status {status} from {service}")]
    UnexpectedStatus {
        /// Service name
        service: String,
        /// HTTP status code
        status: u16,
    },

    /// Snapshot persistence errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Work submitted after shutdown began
    #[error("Shut down: {0}")]
    Shutdown(String),
}

impl Error {
    /// Create a lookup error for a named service
    pub fn lookup(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lookup {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an unexpected status error
    pub fn unexpected_status(service: impl Into<String>, status: u16) -> Self {
        Self::UnexpectedStatus {
            service: service.into(),
            status,
        }
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a shutdown error
    pub fn shutdown(msg: impl Into<String>) -> Self {
        Self::Shutdown(msg.into())
    }

    /// Whether the failure happened before any answer came back from upstream
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unexpected_status("availability", 503);
        assert_eq!(err.to_string(), "Unexpected HTTP status 503 from availability");

        let err = Error::lookup("history", "Player not found");
        assert_eq!(err.to_string(), "Lookup error (history): Player not found");
    }

    #[test]
    fn test_transport_classification() {
        assert!(Error::transport("timed out").is_transport());
        assert!(!Error::persistence("disk full").is_transport());
    }

    #[test]
    fn test_io_and_json_conversions() {
        fn parse(raw: &str) -> Result<Vec<String>> {
            Ok(serde_json::from_str(raw)?)
        }
        assert!(matches!(parse("not json"), Err(Error::Json(_))));

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(err.to_string().starts_with("I/O error: "));
    }
}
