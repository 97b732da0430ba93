//! Response classification
//!
//! The update API answers with a short plaintext body (`good 1.2.3.4`,
//! `nochg 1.2.3.4`, `badauth`, `911`, ...) whose full vocabulary is not
//! documented. [`classify`] maps a body to an [`Outcome`] by prioritized
//! substring matching; anything unrecognized is treated as a server-side
//! failure rather than ignored.
//!
//! [`Classifier::apply`] then performs the outcome's side effects on the IP
//! cache and quarantine store.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::cache::IpCache;
use crate::config::QuarantineConfig;
use crate::error::Result;
use crate::quarantine::{QuarantineStatus, QuarantineStore};

/// Why an update was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// A hostname does not exist on the account
    NoHost,
    /// Credentials rejected
    BadAuth,
    /// This client's user agent has been banned
    BadAgent,
    /// The account plan does not include this operation
    NotDonator,
    /// The account has been blocked for abuse
    Abuse,
    /// `911` or any body the classifier does not recognize
    ServerError,
}

/// What a failure does to the quarantine record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarantinePolicy {
    /// Leave the record alone
    None,
    /// Quarantine with no deadline
    Indefinite,
    /// Quarantine for the configured server error period
    Timed,
}

impl FailureCategory {
    /// Quarantine imposed by this failure
    pub fn quarantine_policy(&self) -> QuarantinePolicy {
        match self {
            Self::NoHost | Self::BadAuth | Self::NotDonator => QuarantinePolicy::None,
            Self::BadAgent | Self::Abuse => QuarantinePolicy::Indefinite,
            Self::ServerError => QuarantinePolicy::Timed,
        }
    }

    /// Whether the operator must change configuration before updates can work
    pub fn is_configuration_problem(&self) -> bool {
        matches!(self, Self::NoHost | Self::BadAuth | Self::NotDonator)
    }

    /// Operator-facing explanation
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoHost => "There is no DNS record for one or more hostnames, check config",
            Self::BadAuth => "The supplied credentials seem to be invalid, check config",
            Self::BadAgent => "This update agent has been banned",
            Self::NotDonator => "Update operation not supported by your subscription",
            Self::Abuse => "Abuse reported for this account",
            Self::ServerError => "The update server reported a problem",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NoHost => "nohost",
            Self::BadAuth => "badauth",
            Self::BadAgent => "badagent",
            Self::NotDonator => "!donator",
            Self::Abuse => "abuse",
            Self::ServerError => "server error",
        };
        f.write_str(name)
    }
}

/// Result of classifying an update response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response echoes the submitted IP
    Success,
    /// The response reports a failure
    Failure(FailureCategory),
}

impl Outcome {
    /// Whether the update was accepted
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Failure tokens in match priority order
const RESPONSE_TOKENS: [(&str, FailureCategory); 5] = [
    ("nohost", FailureCategory::NoHost),
    ("badauth", FailureCategory::BadAuth),
    ("badagent", FailureCategory::BadAgent),
    ("!donator", FailureCategory::NotDonator),
    ("abuse", FailureCategory::Abuse),
];

/// Classify an update response
///
/// First match wins:
/// 1. the body contains `submitted_ip` -> `Success`
/// 2. the body contains a token from `RESPONSE_TOKENS`, in table order
/// 3. otherwise `ServerError`
pub fn classify(response: &str, submitted_ip: &str) -> Outcome {
    if response.contains(submitted_ip) {
        return Outcome::Success;
    }

    RESPONSE_TOKENS
        .iter()
        .find(|(token, _)| response.contains(token))
        .map(|(_, category)| Outcome::Failure(*category))
        .unwrap_or(Outcome::Failure(FailureCategory::ServerError))
}

/// Applies classified outcomes to the durable records
#[derive(Debug, Clone)]
pub struct Classifier {
    server_error_quarantine: chrono::Duration,
}

impl Classifier {
    /// Create a classifier with the configured server error period
    pub fn new(config: &QuarantineConfig) -> Self {
        Self {
            server_error_quarantine: config.server_error_duration(),
        }
    }

    /// Classify `response` and apply the outcome
    ///
    /// Returns the outcome and the quarantine it imposed, if any.
    pub async fn classify_and_apply(
        &self,
        response: &str,
        submitted_ip: &str,
        cache: &IpCache,
        quarantine: &QuarantineStore,
        now: DateTime<Utc>,
    ) -> Result<(Outcome, Option<QuarantineStatus>)> {
        let outcome = classify(response, submitted_ip);
        let imposed = self
            .apply(outcome, submitted_ip, cache, quarantine, now)
            .await?;
        Ok((outcome, imposed))
    }

    /// Perform the side effects of `outcome`
    ///
    /// - `Success`: cache `submitted_ip`
    /// - indefinite policy: quarantine with no deadline
    /// - timed policy: quarantine until `now` plus the server error period
    /// - no policy: nothing is written
    pub async fn apply(
        &self,
        outcome: Outcome,
        submitted_ip: &str,
        cache: &IpCache,
        quarantine: &QuarantineStore,
        now: DateTime<Utc>,
    ) -> Result<Option<QuarantineStatus>> {
        let category = match outcome {
            Outcome::Success => {
                cache.store(submitted_ip).await?;
                info!("Update for {} accepted", submitted_ip);
                return Ok(None);
            }
            Outcome::Failure(category) => category,
        };

        match category.quarantine_policy() {
            QuarantinePolicy::None => {
                warn!("Update rejected ({}): {}", category, category.description());
                Ok(None)
            }
            QuarantinePolicy::Indefinite => {
                error!(
                    "Update rejected ({}): {}, quarantining indefinitely",
                    category,
                    category.description()
                );
                quarantine.quarantine(None).await.map(Some)
            }
            QuarantinePolicy::Timed => {
                let status = quarantine
                    .quarantine(Some(now + self.server_error_quarantine))
                    .await?;
                warn!(
                    "Update rejected ({}): {}, {}",
                    category,
                    category.description(),
                    status
                );
                Ok(Some(status))
            }
        }
    }
}
