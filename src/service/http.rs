//! HTTP client for fetching finished artifacts
//!
//! Result locators returned by long-running jobs are plain URLs; this
//! client downloads them. It performs exactly one request per call —
//! retrying belongs to [`retry::execute`](crate::retry::execute) at the
//! call site, which also classifies the status-code text in
//! [`FetchError`] messages.

use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("connection timeout")]
    Timeout,

    #[error("too many redirects")]
    TooManyRedirects,
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// HTTP fetcher configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: "Renderbox/0.1.0".to_string(),
        }
    }
}

/// Downloads artifact bytes from a result locator.
pub struct ArtifactFetcher {
    client: Client,
}

impl ArtifactFetcher {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        Ok(Self { client })
    }

    /// Fetch the artifact at `url` once, failing on any non-2xx status.
    ///
    /// The status code is embedded in the error message so the default
    /// retry classifier can distinguish 5xx from 4xx responses.
    pub async fn fetch(&self, url: &str) -> Result<Bytes> {
        debug!(url, "fetching artifact");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else if e.is_redirect() {
                FetchError::TooManyRedirects
            } else {
                FetchError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::RequestFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::RequestFailed(format!("failed to read body: {}", e)))?;

        debug!(url, size = bytes.len(), "artifact fetched");

        Ok(bytes)
    }
}
