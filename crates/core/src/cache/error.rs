use thiserror::Error;

use super::{CacheKey, Status};

/// Failure reported by the transport collaborator.
///
/// The payload is opaque to the cache: it is stored and handed back to
/// subscribers, never interpreted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status, when the failure came from a response.
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

/// Errors that can occur during cache operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Invalid transition for {key}: {from} -> {to}")]
    InvalidTransition {
        key: CacheKey,
        from: Status,
        to: Status,
    },
    #[error("Serving stale value for {key} after background refetch failed: {source}")]
    StaleServedWithBackgroundError {
        key: CacheKey,
        source: TransportError,
    },
    #[error("Failed to decode cached value: {0}")]
    Deserialize(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
