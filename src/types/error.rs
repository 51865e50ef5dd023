//! Error types and handling for linkpage
//!
//! One error enum is shared by the server, the storage layer and the client
//! core. Its [`ErrorKind`] is what crosses the wire, so a failure raised by the
//! authority surfaces on the client as the same variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for linkpage
#[derive(Error, Debug)]
pub enum Error {
    /// No valid session for an operation that needs one
    #[error("Not authenticated")]
    Unauthenticated,

    /// Index or id does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed URL, empty required field, wrong component variant
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport or network failure
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Scrape target could not be turned into a post
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage backend errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wire-level classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`Error::Unauthenticated`]
    Unauthenticated,
    /// See [`Error::NotFound`]
    NotFound,
    /// See [`Error::InvalidInput`]
    InvalidInput,
    /// See [`Error::Unavailable`]
    Unavailable,
    /// See [`Error::Unsupported`]
    Unsupported,
    /// Everything that is the server's fault
    Internal,
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an unsupported error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Wire classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unauthenticated => ErrorKind::Unauthenticated,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Unavailable(_) => ErrorKind::Unavailable,
            Error::Unsupported(_) => ErrorKind::Unsupported,
            _ => ErrorKind::Internal,
        }
    }

    /// Rebuild an error received from the remote authority
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Unauthenticated => Error::Unauthenticated,
            ErrorKind::NotFound => Error::NotFound(message),
            ErrorKind::InvalidInput => Error::InvalidInput(message),
            ErrorKind::Unavailable => Error::Unavailable(message),
            ErrorKind::Unsupported => Error::Unsupported(message),
            ErrorKind::Internal => Error::Internal(message),
        }
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Unauthenticated
                | Error::NotFound(_)
                | Error::InvalidInput(_)
                | Error::Unsupported(_)
        )
    }

    /// Check if this is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_wire() {
        let err = Error::not_found("component at index 5");
        let rebuilt = Error::from_kind(err.kind(), "component at index 5");
        assert!(matches!(rebuilt, Error::NotFound(msg) if msg == "component at index 5"));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InvalidInput).unwrap();
        assert_eq!(json, "\"invalid_input\"");
    }

    #[test]
    fn test_storage_failures_are_server_errors() {
        assert!(Error::storage("disk full").is_server_error());
        assert!(Error::Unavailable("timeout".into()).is_server_error());
        assert!(Error::Unauthenticated.is_client_error());
    }
}
