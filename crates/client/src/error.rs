//! Client error types.

use stockroom_core::cache::TransportError;
use thiserror::Error;

/// Result type alias for client module.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ClientError> for TransportError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::ServerError { status, message } => {
                TransportError::with_status(status, message)
            }
            ClientError::NotFound { resource } => {
                TransportError::with_status(404, format!("Resource not found: {}", resource))
            }
            ClientError::Request(e) => match e.status() {
                Some(status) => TransportError::with_status(status.as_u16(), e.to_string()),
                None => TransportError::new(e.to_string()),
            },
            other => TransportError::new(other.to_string()),
        }
    }
}
