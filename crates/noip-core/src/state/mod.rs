// # Slot Store Implementations
//
// This module provides implementations of the SlotStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileSlot;
pub use memory::MemorySlot;
