// # No-IP Update Provider
//
// This crate provides the No-IP `nic/update` implementation of DnsProvider.
//
// ## Behavior
//
// - One authenticated GET per update, all hostnames in the same request
// - The body is returned whatever the HTTP status (`badauth` arrives as 401)
// - Only transport failures are errors; interpretation belongs to the
//   classifier in noip-core
// - ❌ NO retry logic (the next scheduled run retries, quarantine permitting)
//
// ## Security Requirements
//
// - Password NEVER appears in logs or Debug output
//
// ## API Reference
//
// ```http
// GET /nic/update?myip=203.0.113.5&hostname=home.example.net&hostname=nas.example.net
// Authorization: Basic <base64(username:password)>
// User-Agent: noipd ddns update client/0.1.0
// ```

use async_trait::async_trait;
use noip_core::config::{Credentials, ProviderConfig};
use noip_core::traits::DnsProvider;
use noip_core::{Error, Result};
use std::time::Duration;

/// Default HTTP timeout for update requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// No-IP update API provider
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the password.
pub struct NoIpProvider {
    /// Update endpoint
    update_url: String,

    /// Account credentials
    /// ⚠️ NEVER log the password
    credentials: Credentials,

    /// User agent; No-IP bans misbehaving agents by this string
    user_agent: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for NoIpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoIpProvider")
            .field("update_url", &self.update_url)
            .field("username", &self.credentials.username)
            .field("password", &"<REDACTED>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl NoIpProvider {
    /// Create a new provider
    ///
    /// # Parameters
    ///
    /// - `config`: Endpoint and user agent
    /// - `credentials`: Account username and password
    ///
    /// # Errors
    ///
    /// Fails if the configuration or credentials are invalid, or the HTTP
    /// client cannot be built.
    pub fn new(config: &ProviderConfig, credentials: Credentials) -> Result<Self> {
        config.validate()?;
        credentials.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::provider("noip", format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            update_url: config.update_url.clone(),
            credentials,
            user_agent: config.user_agent.clone(),
            client,
        })
    }

    /// Query parameters for an update call
    fn query(ip: &str, hostnames: &[String]) -> Vec<(&'static str, String)> {
        let mut query = Vec::with_capacity(hostnames.len() + 1);
        query.push(("myip", ip.to_string()));
        query.extend(hostnames.iter().map(|h| ("hostname", h.clone())));
        query
    }
}

#[async_trait]
impl DnsProvider for NoIpProvider {
    async fn update(&self, ip: &str, hostnames: &[String]) -> Result<String> {
        tracing::debug!(
            "Calling {} for {} host(s)",
            self.update_url,
            hostnames.len()
        );

        let response = self
            .client
            .get(&self.update_url)
            .query(&Self::query(ip, hostnames))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .await
            .map_err(|e| Error::provider("noip", format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::provider("noip", format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::debug!("Update endpoint answered HTTP {}", status);
        }

        Ok(body)
    }

    fn provider_name(&self) -> &'static str {
        "noip"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> NoIpProvider {
        let config = ProviderConfig {
            update_url: format!("{}/nic/update", server.uri()),
            user_agent: "noipd-test/1.0".to_string(),
        };
        NoIpProvider::new(&config, Credentials::new("user@example.com", "s3cret")).unwrap()
    }

    #[test]
    fn test_rejects_empty_credentials() {
        let result = NoIpProvider::new(&ProviderConfig::default(), Credentials::new("", "x"));
        assert!(result.is_err());
    }

    #[test]
    fn test_query_repeats_hostname() {
        let query = NoIpProvider::query(
            "203.0.113.5",
            &["a.example.net".to_string(), "b.example.net".to_string()],
        );
        assert_eq!(
            query,
            vec![
                ("myip", "203.0.113.5".to_string()),
                ("hostname", "a.example.net".to_string()),
                ("hostname", "b.example.net".to_string()),
            ]
        );
    }

    #[test]
    fn test_password_not_exposed_in_debug() {
        let provider = NoIpProvider::new(
            &ProviderConfig::default(),
            Credentials::new("user@example.com", "secret_password_12345"),
        )
        .unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_password_12345"));
        assert!(debug_str.contains("NoIpProvider"));
    }

    #[test]
    fn test_provider_name() {
        let provider = NoIpProvider::new(
            &ProviderConfig::default(),
            Credentials::new("user@example.com", "pw"),
        )
        .unwrap();
        assert_eq!(provider.provider_name(), "noip");
    }

    #[tokio::test]
    async fn test_update_sends_ip_hosts_auth_and_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nic/update"))
            .and(query_param("myip", "203.0.113.5"))
            .and(query_param("hostname", "home.example.net"))
            .and(header("user-agent", "noipd-test/1.0"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_string("good 203.0.113.5"))
            .expect(1)
            .mount(&server)
            .await;

        let body = provider_for(&server)
            .update("203.0.113.5", &["home.example.net".to_string()])
            .await
            .unwrap();

        assert_eq!(body, "good 203.0.113.5");
    }

    #[tokio::test]
    async fn test_error_status_still_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nic/update"))
            .respond_with(ResponseTemplate::new(401).set_body_string("badauth"))
            .mount(&server)
            .await;

        let body = provider_for(&server)
            .update("203.0.113.5", &["home.example.net".to_string()])
            .await
            .unwrap();

        assert_eq!(body, "badauth");
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        let config = ProviderConfig {
            update_url: "http://127.0.0.1:9/nic/update".to_string(),
            user_agent: "noipd-test/1.0".to_string(),
        };
        let provider =
            NoIpProvider::new(&config, Credentials::new("user@example.com", "pw")).unwrap();

        let result = provider
            .update("203.0.113.5", &["home.example.net".to_string()])
            .await;

        assert!(matches!(result, Err(Error::Provider { .. })));
    }
}
