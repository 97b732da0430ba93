// # noip-core
//
// Core library for the No-IP dynamic DNS update client.
//
// ## Architecture Overview
//
// One invocation of the client is one pass through the update cycle:
// - **IpSource**: Trait for fetching text that contains the public IP
// - **DnsProvider**: Trait for reporting an IP to the update API
// - **SlotStore**: Trait for the two durable single-value records
// - **IpCache**: Last successfully reported IP
// - **QuarantineStore**: Optional "do not call the API until" record
// - **Classifier**: Maps update responses to outcomes and applies them
// - **UpdateEngine**: Orchestrates quarantine check → resolve → compare → update → classify
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decision logic is separate from network and storage plumbing
// 2. **Single Pass**: No loops, no retries; scheduling is external
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Explicit Side Effects**: Expiring a quarantine is a visible step, not a hidden one

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod state;
pub mod cache;
pub mod quarantine;
pub mod classifier;
pub mod clock;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, SlotStore};
pub use engine::{UpdateEngine, RunOutcome, EngineStatus};
pub use config::NoipConfig;
pub use error::{Error, Result};
pub use state::{MemorySlot, FileSlot};
pub use cache::IpCache;
pub use quarantine::{QuarantineStore, QuarantineStatus};
pub use classifier::{Classifier, FailureCategory, Outcome, classify};
pub use clock::{Clock, ManualClock, SystemClock};
