//! Storage backends
//!
//! # Components
//!
//! - `memory` - Thread-safe in-memory table implementing the storage contract
//! - `snapshot` - Atomic JSON snapshots of the in-memory table

pub mod memory;
pub mod snapshot;

pub use memory::MemoryTable;
