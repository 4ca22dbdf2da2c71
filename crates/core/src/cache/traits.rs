use async_trait::async_trait;
use serde_json::Value;

use super::TransportError;

/// The network collaborator the cache issues requests through.
///
/// Calls are independent and safely retryable; implementations must allow
/// concurrent calls for distinct keys.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Reads `endpoint` with optional arguments.
    async fn fetch(
        &self,
        endpoint: &str,
        args: Option<&Value>,
    ) -> Result<Value, TransportError>;

    /// Performs a write against `endpoint`.
    async fn mutate(
        &self,
        endpoint: &str,
        args: Option<&Value>,
        body: Option<&Value>,
    ) -> Result<Value, TransportError>;
}
