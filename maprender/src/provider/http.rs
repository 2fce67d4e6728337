//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use tracing::trace;

use super::types::ProviderError;

/// Default User-Agent string for tile requests.
///
/// Public tile servers reject anonymous clients, so every request identifies
/// the application.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "maprender/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/maprender/maprender)"
);

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for asynchronous HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// # Returns
    ///
    /// The response body, or an error for transport failures and non-success
    /// status codes.
    fn get(&self, url: &str) -> impl Future<Output = Result<Bytes, ProviderError>> + Send;
}

/// Real HTTP client implementation using async reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with the default User-Agent and timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_settings(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom User-Agent and timeout.
    pub fn with_settings(user_agent: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ProviderError::HttpError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Bytes, ProviderError> {
        trace!(url = url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(format!("Request failed: {}", e)))?;

        // Check HTTP status
        if !response.status().is_success() {
            return Err(ProviderError::HttpError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        // Read response body
        response
            .bytes()
            .await
            .map_err(|e| ProviderError::HttpError(format!("Failed to read response: {}", e)))
    }
}
