//! Configuration types for the noip client
//!
//! A [`NoipConfig`] is built once at process start (see `noipd`) and passed
//! by reference into the components that need it.

use serde::{Deserialize, Serialize};

/// Default "what is my IP" service
pub const DEFAULT_IP_RESOLVER_URL: &str = "http://icanhazip.com/";

/// Default No-IP update endpoint
pub const DEFAULT_UPDATE_URL: &str = "https://dynupdate.no-ip.com/nic/update";

/// Default location of the last-known IP record
pub const DEFAULT_IP_CACHE_PATH: &str = "/tmp/ip.noipy";

/// Default location of the quarantine record
pub const DEFAULT_QUARANTINE_PATH: &str = "/tmp/quarantine.noipy";

/// Default quarantine applied after a provider-side failure
pub const DEFAULT_SERVER_ERROR_QUARANTINE_MINS: u32 = 45;

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoipConfig {
    /// Account credentials for the update API
    #[serde(default)]
    pub credentials: Credentials,

    /// Hostnames to update in a single call
    #[serde(default)]
    pub hostnames: Vec<String>,

    /// Public IP source configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Update API configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Locations of the two durable records
    #[serde(default)]
    pub storage: StorageConfig,

    /// Quarantine policy settings
    #[serde(default)]
    pub quarantine: QuarantineConfig,
}

impl NoipConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            credentials: Credentials::default(),
            hostnames: Vec::new(),
            ip_source: IpSourceConfig::default(),
            provider: ProviderConfig::default(),
            storage: StorageConfig::default(),
            quarantine: QuarantineConfig::default(),
        }
    }

    /// Parse a configuration from a JSON document
    ///
    /// Missing sections fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.credentials.validate()?;

        if self.hostnames.is_empty() {
            return Err(crate::Error::config("No hostnames configured"));
        }
        if let Some(empty) = self.hostnames.iter().position(|h| h.trim().is_empty()) {
            return Err(crate::Error::config(format!(
                "Hostname at position {} is empty",
                empty
            )));
        }

        self.ip_source.validate()?;
        self.provider.validate()?;
        self.storage.validate()?;
        self.quarantine.validate()?;

        Ok(())
    }
}

impl Default for NoipConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Update API credentials
///
/// The Debug implementation does NOT expose the password.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Account username or email
    pub username: String,
    /// Account password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

impl Credentials {
    /// Create credentials from already-resolved strings
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Validate the credentials
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.username.is_empty() {
            return Err(crate::Error::config("Username cannot be empty"));
        }
        if self.password.is_empty() {
            return Err(crate::Error::config("Password cannot be empty"));
        }
        Ok(())
    }
}

/// Public IP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL returning text that contains the caller's IPv4 address
    #[serde(default = "default_ip_resolver_url")]
    pub url: String,
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_http_url("IP resolver URL", &self.url)
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_resolver_url(),
        }
    }
}

/// Update API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The `nic/update` endpoint
    #[serde(default = "default_update_url")]
    pub update_url: String,

    /// User agent sent with every update call
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_http_url("Update URL", &self.update_url)?;
        if self.user_agent.trim().is_empty() {
            return Err(crate::Error::config("User agent cannot be empty"));
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            update_url: default_update_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Locations of the durable records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the last-known IP record
    #[serde(default = "default_ip_cache_path")]
    pub ip_cache_path: String,

    /// Path of the quarantine record
    #[serde(default = "default_quarantine_path")]
    pub quarantine_path: String,
}

impl StorageConfig {
    /// Validate the storage configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ip_cache_path.is_empty() {
            return Err(crate::Error::config("IP cache path cannot be empty"));
        }
        if self.quarantine_path.is_empty() {
            return Err(crate::Error::config("Quarantine path cannot be empty"));
        }
        if self.ip_cache_path == self.quarantine_path {
            return Err(crate::Error::config(
                "IP cache and quarantine records must use different paths",
            ));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ip_cache_path: default_ip_cache_path(),
            quarantine_path: default_quarantine_path(),
        }
    }
}

/// Quarantine policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantineConfig {
    /// Minutes to stay quiet after an unrecognized or `911` response
    #[serde(default = "default_server_error_minutes")]
    pub server_error_minutes: u32,
}

impl QuarantineConfig {
    /// Validate the quarantine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.server_error_minutes == 0 {
            return Err(crate::Error::config(
                "Server error quarantine must be at least one minute",
            ));
        }
        Ok(())
    }

    /// Server error quarantine as a duration
    pub fn server_error_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.server_error_minutes))
    }
}

impl Default for QuarantineConfig {
    fn default() -> Self {
        Self {
            server_error_minutes: default_server_error_minutes(),
        }
    }
}

fn validate_http_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", what)));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            what, url
        )));
    }
    Ok(())
}

fn default_ip_resolver_url() -> String {
    DEFAULT_IP_RESOLVER_URL.to_string()
}

fn default_update_url() -> String {
    DEFAULT_UPDATE_URL.to_string()
}

fn default_user_agent() -> String {
    format!("noipd ddns update client/{}", env!("CARGO_PKG_VERSION"))
}

fn default_ip_cache_path() -> String {
    DEFAULT_IP_CACHE_PATH.to_string()
}

fn default_quarantine_path() -> String {
    DEFAULT_QUARANTINE_PATH.to_string()
}

fn default_server_error_minutes() -> u32 {
    DEFAULT_SERVER_ERROR_QUARANTINE_MINS
}
