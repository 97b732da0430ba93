// # Memory Slot
//
// In-memory implementation of SlotStore.
//
// ## Purpose
//
// Provides a slot that doesn't persist across restarts. Useful for tests and
// for embedding the engine where the caller manages persistence.
//
// Clones share the same underlying value, so a test can keep a handle and
// inspect what the engine wrote.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::SlotStore;

/// In-memory slot implementation
///
/// # Example
///
/// ```rust,no_run
/// use noip_core::state::MemorySlot;
/// use noip_core::traits::SlotStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let slot = MemorySlot::new();
///
///     slot.store("203.0.113.5").await?;
///     assert_eq!(slot.load().await?, Some("203.0.113.5".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    inner: Arc<RwLock<Option<String>>>,
}

impl MemorySlot {
    /// Create a new empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot already holding `value`
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(value.into()))),
        }
    }

    /// Current payload
    pub async fn get(&self) -> Option<String> {
        self.inner.read().await.clone()
    }

    /// Check if the slot is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_none()
    }
}

#[async_trait]
impl SlotStore for MemorySlot {
    async fn load(&self) -> Result<Option<String>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn store(&self, value: &str) -> Result<(), Error> {
        *self.inner.write().await = Some(value.to_string());
        Ok(())
    }

    async fn delete(&self) -> Result<(), Error> {
        *self.inner.write().await = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
