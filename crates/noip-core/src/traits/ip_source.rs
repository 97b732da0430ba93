// # IP Source Trait
//
// Defines the interface for discovering the caller's public IP address.
//
// ## Implementations
//
// - HTTP "what is my IP" service: `noip-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use noip_core::traits::{IpSource, extract_ipv4};
//
// #[tokio::main]
// async fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let source = /* IpSource implementation */;
//
//     let body = source.fetch().await?;
//     let ip = extract_ipv4(&body);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

/// First dotted-quad shaped run of digits in free-form text
static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}")
        .expect("IPv4 pattern is a valid regex")
});

/// Extract the first IPv4-shaped substring from resolver output
///
/// The match is purely lexical: octets are not range-checked, mirroring the
/// loose formats returned by public "what is my IP" services.
///
/// # Returns
///
/// - `Some(String)`: The first match, verbatim
/// - `None`: The text contains nothing IPv4-shaped
pub fn extract_ipv4(text: &str) -> Option<String> {
    IPV4_PATTERN.find(text).map(|m| m.as_str().to_string())
}

/// Trait for public IP source implementations
///
/// An IP source performs exactly one network call per [`fetch`](IpSource::fetch)
/// and returns the body unparsed. Extracting the address is owned by the
/// engine so that every source is interpreted the same way.
///
/// # Forbidden Capabilities
/// - ❌ Retry or fall back between services (the next scheduled run retries)
/// - ❌ Cache the result (owned by the IP cache)
/// - ❌ Decide whether an update is needed (owned by `UpdateEngine`)
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch free-form text containing the caller's IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The raw response body
    /// - `Err(Error)`: Network failure or unusable response
    async fn fetch(&self) -> Result<String, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
