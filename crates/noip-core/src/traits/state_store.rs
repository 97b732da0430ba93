// # Slot Store Trait
//
// Defines the interface for durable single-value records.
//
// ## Purpose
//
// The client persists exactly two things between invocations, each in its
// own slot:
// - The last IP successfully reported (IP cache)
// - An optional quarantine deadline (quarantine store)
//
// A slot holds a small text payload with no schema beyond the literal value.
// An empty payload is a valid value and is distinct from an absent slot.
//
// ## Implementations
//
// - File-based: one plain text file per slot
// - Memory: for tests and embedding

use async_trait::async_trait;

/// Trait for slot store implementations
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
/// - ✅ Create parent directories on first write
///
/// ## Forbidden Capabilities
/// - ❌ Interpret the payload (owned by the IP cache and quarantine store)
/// - ❌ Spawn background tasks
///
/// ## Implementation Guidelines
///
/// - **Atomic overwrite**: a reader must see either the old or the new
///   payload, never a mix
/// - **Delete is idempotent**: deleting an absent slot succeeds
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Load the payload
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: The stored payload (possibly empty)
    /// - `Ok(None)`: Nothing stored
    /// - `Err(Error::CorruptState)`: Something is stored but it is not text
    /// - `Err(Error)`: Storage error
    async fn load(&self) -> Result<Option<String>, crate::Error>;

    /// Replace the payload
    async fn store(&self, value: &str) -> Result<(), crate::Error>;

    /// Remove the payload
    ///
    /// Succeeds when nothing is stored.
    async fn delete(&self) -> Result<(), crate::Error>;

    /// Human-readable location of the slot (for logging)
    fn describe(&self) -> String;
}
