//! Collaborator traits for the noip client
//!
//! This module defines the seams between the update engine and the outside world.
//!
//! - [`IpSource`]: Fetch text that contains the caller's public IP
//! - [`DnsProvider`]: Report an IP for a set of hostnames to the update API
//! - [`SlotStore`]: Durable single-value record (IP cache, quarantine)

pub mod ip_source;
pub mod dns_provider;
pub mod state_store;

pub use ip_source::{IpSource, extract_ipv4};
pub use dns_provider::DnsProvider;
pub use state_store::SlotStore;
