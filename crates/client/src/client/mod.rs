//! HTTP transport for the stockroom API.

pub mod route;

use async_trait::async_trait;
use serde_json::Value;
use stockroom_core::cache::{Transport, TransportError};

use crate::error::{ClientError, Result};
use route::{query_pairs, Route};

/// Default API location when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// HTTP client for the stockroom API, used by the cache as its transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a new transport with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from environment (STOCKROOM_API_URL, API_BASE_URL or default).
    pub fn from_env() -> Self {
        let base_url = std::env::var("STOCKROOM_API_URL")
            .or_else(|_| std::env::var("API_BASE_URL"))
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a URL for an endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, endpoint: &str, args: Option<&Value>) -> Result<Value> {
        let route = Route::parse(endpoint, None)?;
        let response = self
            .client
            .request(route.method, self.url(&route.path))
            .query(&query_pairs(args))
            .send()
            .await?;
        self.handle_response(&route.path, response).await
    }

    async fn send(
        &self,
        endpoint: &str,
        args: Option<&Value>,
        body: Option<&Value>,
    ) -> Result<Value> {
        let route = Route::parse(endpoint, args)?;
        let mut request = self.client.request(route.method, self.url(&route.path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        self.handle_response(&route.path, response).await
    }

    /// Handle error responses. An empty success body reads as `null`.
    async fn handle_response(&self, path: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&text).map_err(ClientError::from)
        } else if status.as_u16() == 404 {
            Err(ClientError::NotFound {
                resource: path.to_string(),
            })
        } else {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(ClientError::ServerError {
                status: status.as_u16(),
                message: error_message(&text),
            })
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(
        &self,
        endpoint: &str,
        args: Option<&Value>,
    ) -> std::result::Result<Value, TransportError> {
        tracing::debug!(endpoint, "GET");
        self.get(endpoint, args).await.map_err(TransportError::from)
    }

    async fn mutate(
        &self,
        endpoint: &str,
        args: Option<&Value>,
        body: Option<&Value>,
    ) -> std::result::Result<Value, TransportError> {
        tracing::debug!(endpoint, "Sending mutation");
        self.send(endpoint, args, body)
            .await
            .map_err(TransportError::from)
    }
}

/// The server reports failures as `{"message": "..."}`; anything else is
/// passed through as text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
