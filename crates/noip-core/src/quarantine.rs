//! Quarantine record
//!
//! A single durable slot that, when present, stops the client from talking
//! to the update API:
//!
//! | payload               | meaning                                  |
//! |-----------------------|------------------------------------------|
//! | slot absent           | not quarantined                          |
//! | empty (or whitespace) | quarantined indefinitely                 |
//! | timestamp             | quarantined until that instant (UTC)     |
//!
//! Expiry is lazy. [`QuarantineStore::inspect`] only reads;
//! [`QuarantineStore::check`] reads and then deletes an expired record,
//! reporting [`QuarantineStatus::Expired`] so the deletion is visible to the
//! caller. An indefinite record is only ever removed by
//! [`QuarantineStore::lift`].

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

use crate::error::{Error, Result};
use crate::traits::SlotStore;

/// On-disk timestamp format
///
/// Parsing uses `%.f`, which also accepts a timestamp without a fractional
/// part.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Quarantine state as seen at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarantineStatus {
    /// No record
    Clear,
    /// Record without a deadline
    Indefinite,
    /// Record with a deadline still in the future
    Until(DateTime<Utc>),
    /// Record with a deadline at or before now
    Expired(DateTime<Utc>),
}

impl QuarantineStatus {
    /// Whether update calls are currently forbidden
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Indefinite | Self::Until(_))
    }
}

impl std::fmt::Display for QuarantineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clear => write!(f, "not quarantined"),
            Self::Indefinite => write!(f, "quarantined indefinitely"),
            Self::Until(until) => write!(f, "quarantined until {}", until.format(TIMESTAMP_FORMAT)),
            Self::Expired(until) => write!(f, "quarantine expired at {}", until.format(TIMESTAMP_FORMAT)),
        }
    }
}

/// Durable store of the optional quarantine deadline
pub struct QuarantineStore {
    slot: Box<dyn SlotStore>,
}

impl QuarantineStore {
    /// Wrap a slot
    pub fn new(slot: Box<dyn SlotStore>) -> Self {
        Self { slot }
    }

    /// Read the quarantine state without modifying it
    ///
    /// # Errors
    ///
    /// `Error::CorruptState` if the record is not text, or holds something
    /// other than a timestamp in [`TIMESTAMP_FORMAT`].
    pub async fn inspect(&self, now: DateTime<Utc>) -> Result<QuarantineStatus> {
        let Some(payload) = self.slot.load().await? else {
            return Ok(QuarantineStatus::Clear);
        };

        let payload = payload.trim();
        if payload.is_empty() {
            return Ok(QuarantineStatus::Indefinite);
        }

        let until = NaiveDateTime::parse_from_str(payload, TIMESTAMP_PARSE_FORMAT)
            .map_err(|e| {
                Error::corrupt_state(format!(
                    "Unreadable quarantine deadline {:?} in {}: {}",
                    payload,
                    self.slot.describe(),
                    e
                ))
            })?
            .and_utc();

        if now >= until {
            Ok(QuarantineStatus::Expired(until))
        } else {
            Ok(QuarantineStatus::Until(until))
        }
    }

    /// Read the quarantine state and delete the record if it has expired
    ///
    /// Returns `Expired` exactly once per expired record: the following call
    /// finds nothing and returns `Clear`.
    pub async fn check(&self, now: DateTime<Utc>) -> Result<QuarantineStatus> {
        let status = self.inspect(now).await?;
        if let QuarantineStatus::Expired(until) = status {
            self.slot.delete().await?;
            tracing::debug!(
                "Removed expired quarantine ({}) from {}",
                until.format(TIMESTAMP_FORMAT),
                self.slot.describe()
            );
        }
        Ok(status)
    }

    /// Whether update calls are forbidden at `now`
    ///
    /// Shorthand for [`check`](Self::check), including its expiry deletion.
    pub async fn is_quarantined(&self, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.check(now).await?.is_active())
    }

    /// Write a quarantine record, replacing any previous one
    ///
    /// `None` quarantines indefinitely. A deadline is stored with microsecond
    /// precision; the returned status carries the deadline exactly as stored.
    pub async fn quarantine(&self, until: Option<DateTime<Utc>>) -> Result<QuarantineStatus> {
        match until {
            None => {
                self.slot.store("").await?;
                Ok(QuarantineStatus::Indefinite)
            }
            Some(until) => {
                let until = until.trunc_subsecs(6);
                self.slot
                    .store(&until.format(TIMESTAMP_FORMAT).to_string())
                    .await?;
                Ok(QuarantineStatus::Until(until))
            }
        }
    }

    /// Remove any quarantine record, indefinite ones included
    ///
    /// Returns `true` if a record was present.
    pub async fn lift(&self) -> Result<bool> {
        let present = match self.slot.load().await {
            Ok(payload) => payload.is_some(),
            Err(e) if e.is_corrupt_state() => true,
            Err(e) => return Err(e),
        };
        self.slot.delete().await?;
        Ok(present)
    }
}
