//! Last-known IP record
//!
//! Holds the address from the most recent success outcome. The payload is
//! opaque text: it is compared byte for byte against the freshly resolved
//! address and never parsed, so a hand-edited or truncated record simply
//! reads as "changed". A record that is not even text reads as absent, and
//! the next success overwrites it.

use crate::error::Result;
use crate::traits::SlotStore;

/// Durable single-value store of the last successfully reported IP
pub struct IpCache {
    slot: Box<dyn SlotStore>,
}

impl IpCache {
    /// Wrap a slot
    pub fn new(slot: Box<dyn SlotStore>) -> Self {
        Self { slot }
    }

    /// Last reported IP, if any
    pub async fn load(&self) -> Result<Option<String>> {
        match self.slot.load().await {
            Err(e) if e.is_corrupt_state() => {
                tracing::warn!("Ignoring IP cache: {}", e);
                Ok(None)
            }
            other => other,
        }
    }

    /// Record `ip` as the last reported IP
    pub async fn store(&self, ip: &str) -> Result<()> {
        self.slot.store(ip).await?;
        tracing::debug!("Cached IP {} in {}", ip, self.slot.describe());
        Ok(())
    }
}
