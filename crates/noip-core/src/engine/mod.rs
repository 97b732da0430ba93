//! Core update engine
//!
//! The UpdateEngine performs one pass of the update cycle:
//! - Checking (and lazily expiring) the quarantine record
//! - Resolving the public IP via IpSource
//! - Comparing it with the IP cache
//! - Reporting it via DnsProvider when it changed
//! - Classifying the response and recording the outcome
//!
//! ## State Machine
//!
//! ```text
//! CHECK_QUARANTINE ──quarantined──────────────────────────▶ Quarantined
//!        │ clear
//!        ▼
//!   RESOLVE_IP ──failure──────────────────────────────────▶ ResolverFailed
//!        │
//!        ▼
//!  COMPARE_CACHE ──unchanged──────────────────────────────▶ Unchanged
//!        │ changed / no cache
//!        ▼
//! CALL_UPDATE_API ──transport failure─────────────────────▶ TransportFailed
//!        │ response
//!        ▼
//!    CLASSIFY ────────────────────────────────────────────▶ Classified
//! ```
//!
//! Only storage errors escape as `Err`; every other failure is a
//! [`RunOutcome`]. Nothing is retried within a pass: the next scheduled
//! invocation is the retry.

use chrono::{DateTime, Utc};

use crate::cache::IpCache;
use crate::classifier::{Classifier, Outcome};
use crate::clock::{Clock, SystemClock};
use crate::config::NoipConfig;
use crate::error::Result;
use crate::quarantine::{QuarantineStatus, QuarantineStore};
use crate::traits::{DnsProvider, IpSource, extract_ipv4};
use tracing::{debug, info, warn};

/// How a single pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// An active quarantine stopped the pass before any network call
    Quarantined {
        status: QuarantineStatus,
    },

    /// The public IP could not be determined
    ResolverFailed {
        reason: String,
    },

    /// The resolved IP matches the cache, no update call made
    Unchanged {
        ip: String,
    },

    /// Dry run: the IP changed but the update call was skipped
    WouldUpdate {
        ip: String,
        cached: Option<String>,
    },

    /// The update call did not complete
    TransportFailed {
        ip: String,
        reason: String,
    },

    /// The update call answered and its response was classified
    Classified {
        ip: String,
        outcome: Outcome,
        /// Quarantine imposed by this outcome
        quarantine: Option<QuarantineStatus>,
    },
}

impl RunOutcome {
    /// Whether the client is quarantined at the end of this pass
    pub fn is_quarantined(&self) -> bool {
        match self {
            Self::Quarantined { .. } => true,
            Self::Classified { quarantine, .. } => quarantine.is_some_and(|q| q.is_active()),
            _ => false,
        }
    }
}

/// Snapshot of the durable records, read without side effects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    /// Last reported IP
    pub cached_ip: Option<String>,
    /// Quarantine state at the time of the snapshot
    pub quarantine: QuarantineStatus,
}

impl EngineStatus {
    /// Read both records as of `now`
    ///
    /// Needs no network collaborators, so it also serves callers that only
    /// have the records at hand.
    pub async fn read(
        cache: &IpCache,
        quarantine: &QuarantineStore,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        Ok(Self {
            cached_ip: cache.load().await?,
            quarantine: quarantine.inspect(now).await?,
        })
    }
}

/// Core update engine
///
/// ## Lifecycle
///
/// 1. Create with [`UpdateEngine::new()`]
/// 2. Call [`UpdateEngine::run_once()`]
/// 3. Exit; scheduling the next pass is the caller's concern
///
/// ## Concurrency
///
/// A pass performs a read-modify-write on both records. Passes sharing the
/// same records must not overlap.
pub struct UpdateEngine {
    /// Public IP source
    ip_source: Box<dyn IpSource>,

    /// Update API
    provider: Box<dyn DnsProvider>,

    /// Last reported IP
    cache: IpCache,

    /// Quarantine record
    quarantine: QuarantineStore,

    /// Outcome side effects
    classifier: Classifier,

    /// Hostnames sent with every update
    hostnames: Vec<String>,

    /// Source of "now"
    clock: Box<dyn Clock>,

    /// Skip the update call, report what would happen
    dry_run: bool,
}

impl UpdateEngine {
    /// Create a new update engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: Public IP source
    /// - `provider`: Update API implementation
    /// - `cache`: Last-known IP record
    /// - `quarantine`: Quarantine record
    /// - `config`: Client configuration (validated here)
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        cache: IpCache,
        quarantine: QuarantineStore,
        config: &NoipConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            provider,
            cache,
            quarantine,
            classifier: Classifier::new(&config.quarantine),
            hostnames: config.hostnames.clone(),
            clock: Box::new(SystemClock),
            dry_run: false,
        })
    }

    /// Replace the system clock
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run one pass of the update cycle
    ///
    /// # Returns
    ///
    /// - `Ok(RunOutcome)`: How the pass ended
    /// - `Err(Error)`: The IP cache or quarantine record could not be read or written
    pub async fn run_once(&self) -> Result<RunOutcome> {
        // CHECK_QUARANTINE
        match self.quarantine.check(self.clock.now()).await {
            Ok(status) if status.is_active() => {
                warn!("This client is {}, exiting", status);
                return Ok(RunOutcome::Quarantined { status });
            }
            Ok(QuarantineStatus::Expired(until)) => {
                info!("Quarantine expired at {}, record removed", until);
            }
            Ok(_) => {}
            Err(e) if e.is_corrupt_state() => {
                warn!("Ignoring quarantine record: {}", e);
            }
            Err(e) => return Err(e),
        }

        // RESOLVE_IP
        let ip = match self.resolve().await {
            Ok(ip) => ip,
            Err(reason) => {
                warn!("Could not determine public IP: {}", reason);
                return Ok(RunOutcome::ResolverFailed { reason });
            }
        };
        debug!("Public IP is {}", ip);

        // COMPARE_CACHE
        let cached = self.cache.load().await?;
        if cached.as_deref() == Some(ip.as_str()) {
            info!("Recorded IP is the same as current IP ({}), no update", ip);
            return Ok(RunOutcome::Unchanged { ip });
        }

        if self.dry_run {
            info!(
                "Dry run: would report {} for {} (cached: {})",
                ip,
                self.hostnames.join(","),
                cached.as_deref().unwrap_or("none")
            );
            return Ok(RunOutcome::WouldUpdate { ip, cached });
        }

        // CALL_UPDATE_API
        info!(
            "Reporting {} for {} via {}",
            ip,
            self.hostnames.join(","),
            self.provider.provider_name()
        );
        let response = match self.provider.update(&ip, &self.hostnames).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Update call failed: {}", e);
                return Ok(RunOutcome::TransportFailed {
                    ip,
                    reason: e.to_string(),
                });
            }
        };
        debug!("Update response: {:?}", response.trim());

        // CLASSIFY
        let (outcome, quarantine) = self
            .classifier
            .classify_and_apply(
                &response,
                &ip,
                &self.cache,
                &self.quarantine,
                self.clock.now(),
            )
            .await?;

        Ok(RunOutcome::Classified {
            ip,
            outcome,
            quarantine,
        })
    }

    /// Read the durable records without modifying them
    pub async fn status(&self) -> Result<EngineStatus> {
        EngineStatus::read(&self.cache, &self.quarantine, self.clock.now()).await
    }

    /// Remove the quarantine record, indefinite ones included
    ///
    /// Returns `true` if a record was present.
    pub async fn lift_quarantine(&self) -> Result<bool> {
        let lifted = self.quarantine.lift().await?;
        if lifted {
            info!("Quarantine lifted");
        }
        Ok(lifted)
    }

    /// Fetch resolver output and extract the IPv4 address
    async fn resolve(&self) -> std::result::Result<String, String> {
        let body = self.ip_source.fetch().await.map_err(|e| e.to_string())?;
        extract_ipv4(&body).ok_or_else(|| {
            format!(
                "no IPv4 address in {} response {:?}",
                self.ip_source.source_name(),
                body.trim()
            )
        })
    }
}
