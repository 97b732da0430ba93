// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for the noip client.
//
// ## Purpose
//
// Asks an external "what is my IP" service (icanhazip.com by default) for
// the caller's public address. The body is returned as-is; the engine pulls
// the first IPv4-shaped substring out of it, so services that answer with a
// bare address and services that wrap it in prose both work.
//
// ## Behavior
//
// - One GET per fetch, no retries, no fallback between services
// - Transport errors and non-2xx statuses are errors
// - 10 second request timeout

use noip_core::traits::IpSource;
use noip_core::{Error, Result};

use std::time::Duration;

/// Default request timeout for the IP service
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the IP from (e.g., "http://icanhazip.com/")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ip_source(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create from the client configuration
    pub fn from_config(config: &noip_core::config::IpSourceConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.url.clone())
    }

    /// URL this source queries
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn fetch(&self) -> Result<String> {
        tracing::debug!("Fetching public IP from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "{} answered HTTP {}",
                self.url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
