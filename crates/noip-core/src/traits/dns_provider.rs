// # DNS Provider Trait
//
// Defines the interface for reporting an IP address to the dynamic DNS
// update API.
//
// ## Implementations
//
// - No-IP `nic/update`: `noip-provider` crate
//
// ## Usage
//
// ```rust,ignore
// use noip_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let provider = /* DnsProvider implementation */;
//
//     let body = provider
//         .update("203.0.113.5", &["home.example.net".to_string()])
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for update API implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform one authenticated HTTP call to the update endpoint
/// - ✅ Return the response body verbatim
///
/// ## Forbidden Capabilities
/// - ❌ Interpret the body (owned by the response classifier)
/// - ❌ Interpret HTTP status codes as success or failure
/// - ❌ Implement retry logic (quarantine and the next scheduled run own it)
/// - ❌ Access the IP cache or quarantine store
///
/// ## Rationale
///
/// The provider's wire format is a small set of undocumented plaintext tokens
/// that sometimes arrive with non-2xx statuses (`badauth` comes back as 401).
/// Returning the body regardless of status keeps all interpretation in one
/// place. Only transport failures are errors.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Report `ip` for every hostname in a single call
    ///
    /// # Parameters
    ///
    /// - `ip`: The address to publish, as extracted by the engine
    /// - `hostnames`: Hostnames to point at `ip`
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The raw response body, whatever the HTTP status
    /// - `Err(Error)`: The request could not be completed
    async fn update(&self, ip: &str, hostnames: &[String]) -> Result<String, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
