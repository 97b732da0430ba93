//! Test doubles and common utilities for contract tests
//!
//! The doubles count their calls so tests can assert which network
//! collaborators a pass touched.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use noip_core::error::{Error, Result};
use noip_core::traits::{DnsProvider, IpSource};
use noip_core::{
    IpCache, ManualClock, MemorySlot, NoipConfig, QuarantineStore, UpdateEngine,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// IP source returning a fixed body (or a fixed failure)
#[derive(Clone)]
pub struct ScriptedIpSource {
    body: Arc<Mutex<std::result::Result<String, String>>>,
    fetch_call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn returning(body: &str) -> Self {
        Self {
            body: Arc::new(Mutex::new(Ok(body.to_string()))),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            body: Arc::new(Mutex::new(Err(reason.to_string()))),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Change what the next fetch returns
    pub fn set_body(&self, body: &str) {
        *self.body.lock().unwrap() = Ok(body.to_string());
    }

    /// Get the number of times fetch() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn fetch(&self) -> Result<String> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        self.body.lock().unwrap().clone().map_err(Error::ip_source)
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// Update API double returning a fixed body (or a transport failure)
#[derive(Clone)]
pub struct ScriptedProvider {
    response: Arc<Mutex<std::result::Result<String, String>>>,
    update_call_count: Arc<AtomicUsize>,
    /// (ip, hostnames) of every call
    calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl ScriptedProvider {
    pub fn responding(body: &str) -> Self {
        Self {
            response: Arc::new(Mutex::new(Ok(body.to_string()))),
            update_call_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unreachable(reason: &str) -> Self {
        Self {
            response: Arc::new(Mutex::new(Err(reason.to_string()))),
            update_call_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Change what the next update returns
    pub fn set_response(&self, body: &str) {
        *self.response.lock().unwrap() = Ok(body.to_string());
    }

    /// Get the number of times update() was called
    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }

    /// Get the arguments of every update() call
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for ScriptedProvider {
    async fn update(&self, ip: &str, hostnames: &[String]) -> Result<String> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push((ip.to_string(), hostnames.to_vec()));
        self.response
            .lock()
            .unwrap()
            .clone()
            .map_err(|e| Error::provider("scripted", e))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Fixed reference instant for tests
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// Helper to create a minimal valid NoipConfig for testing
pub fn minimal_config(hostnames: &[&str]) -> NoipConfig {
    let mut config = NoipConfig::default();
    config.credentials = noip_core::config::Credentials::new("user@example.com", "secret");
    config.hostnames = hostnames.iter().map(|h| h.to_string()).collect();
    config
}

/// Handles onto everything an engine built by [`Harness::engine`] touches
pub struct Harness {
    pub ip_source: ScriptedIpSource,
    pub provider: ScriptedProvider,
    pub cache_slot: MemorySlot,
    pub quarantine_slot: MemorySlot,
    pub clock: ManualClock,
    pub config: NoipConfig,
}

impl Harness {
    pub fn new(resolver_body: &str, provider_body: &str) -> Self {
        Self::with_parts(
            ScriptedIpSource::returning(resolver_body),
            ScriptedProvider::responding(provider_body),
        )
    }

    pub fn with_parts(ip_source: ScriptedIpSource, provider: ScriptedProvider) -> Self {
        Self {
            ip_source,
            provider,
            cache_slot: MemorySlot::new(),
            quarantine_slot: MemorySlot::new(),
            clock: ManualClock::new(t0()),
            config: minimal_config(&["home.example.net"]),
        }
    }

    /// Build an engine sharing this harness' doubles, slots and clock
    ///
    /// Building a second engine simulates the next scheduled invocation.
    pub fn engine(&self) -> UpdateEngine {
        UpdateEngine::new(
            Box::new(self.ip_source.clone()),
            Box::new(self.provider.clone()),
            IpCache::new(Box::new(self.cache_slot.clone())),
            QuarantineStore::new(Box::new(self.quarantine_slot.clone())),
            &self.config,
        )
        .expect("engine construction succeeds")
        .with_clock(Box::new(self.clock.clone()))
    }

    /// A quarantine store over the harness' quarantine slot
    pub fn quarantine_store(&self) -> QuarantineStore {
        QuarantineStore::new(Box::new(self.quarantine_slot.clone()))
    }
}
