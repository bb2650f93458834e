//! HTTP client used to fetch pages and their stylesheets
//!
//! Features:
//! - HTTP/2 when the server offers it, HTTP/1.1 otherwise
//! - TLS 1.3 via rustls
//! - Brotli, Zstd, Gzip compression (auto-negotiated)
//! - Connection pooling with keep-alive
//! - Desktop browser User-Agent (many sites serve reduced markup to bots)

use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, Response};
use tracing::{debug, info, instrument};

/// User-Agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Pooled HTTP client with a per-request timeout
pub struct PageClient {
    client: Client,
    timeout: Duration,
}

impl PageClient {
    /// Create a client with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_user_agent(timeout, DEFAULT_USER_AGENT)
    }

    /// Create a client with a custom User-Agent
    pub fn with_user_agent(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            // ═══════════════════════════════════════════════════════════════
            // CONNECTIONS
            // ═══════════════════════════════════════════════════════════════
            .http2_adaptive_window(true)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .use_rustls_tls()
            // ═══════════════════════════════════════════════════════════════
            // COMPRESSION (auto-negotiated via Accept-Encoding)
            // ═══════════════════════════════════════════════════════════════
            .brotli(true)
            .zstd(true)
            .gzip(true)
            .deflate(true)
            // ═══════════════════════════════════════════════════════════════
            // IDENTITY
            // ═══════════════════════════════════════════════════════════════
            .user_agent(user_agent)
            // ═══════════════════════════════════════════════════════════════
            // TIMEOUTS
            // ═══════════════════════════════════════════════════════════════
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .build()?;

        Ok(Self { client, timeout })
    }

    /// GET a URL, failing on non-success status codes
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<Response> {
        debug!("Fetching");
        let response = self.client.get(url).send().await?.error_for_status()?;

        info!(
            status = %response.status(),
            version = ?response.version(),
            "Response received"
        );

        Ok(response)
    }

    /// GET a URL with a tighter timeout than the client default
    pub async fn fetch_text_within(&self, url: &str, timeout: Duration) -> Result<String> {
        let text = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    /// Fetch and return body as string
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.fetch(url).await?;
        let text = response.text().await?;
        Ok(text)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_custom_user_agent() {
        let client = PageClient::with_user_agent(Duration::from_secs(3), "stylescout-test").unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let client = PageClient::new(Duration::from_secs(2)).unwrap();
        assert!(client.fetch_text("http://127.0.0.1:9/").await.is_err());
    }
}
