//! HTTP fetching for the manifest pipeline
//!
//! [`PageFetcher`] is the seam to the host's HTTP stack. [`HttpFetcher`]
//! is a bundled reqwest implementation for hosts that do not bring one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ResolveError, Result};

/// Desktop Firefox user agent; player pages change behavior for unknown clients
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:131.0) Gecko/20100101 Firefox/131.0";

/// Configuration for the HTTP client
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Accept-Language sent with every request
    pub accept_language: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "it-IT,it;q=0.9,en;q=0.8".to_string(),
        }
    }
}

/// A fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Raw response text
    pub body: String,
}

/// HTTP GET with caller-supplied headers
///
/// Implementations must report non-success statuses and transport errors
/// (including timeouts) as `NetworkFailure`, and must not retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<FetchedPage>;
}

/// reqwest-backed [`PageFetcher`]
///
/// Follows redirects and keeps no cookie jar, so concurrent resolutions
/// share no state beyond the connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a new fetcher with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a new fetcher with custom configuration
    ///
    /// # Errors
    /// Returns `InvalidConfig` if a header value is not valid or the
    /// client cannot be built
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let accept_language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| ResolveError::InvalidConfig(format!("accept_language: {e}")))?;
        headers.insert(ACCEPT_LANGUAGE, accept_language);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| ResolveError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<FetchedPage> {
        debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| ResolveError::network(url, describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::network(
                url,
                format!("HTTP status {}", status.as_u16()),
            ));
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::network(url, describe(&e)))?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}
