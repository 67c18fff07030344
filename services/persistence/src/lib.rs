//! Persistence boundary for the order book engine
//!
//! Defines the byte-addressable key-value `Store` contract the matching
//! engine persists through, plus an in-memory implementation used by
//! tests and bootstrap. Keys are opaque byte strings derived from keccak
//! slots; values are codec-produced blobs.

pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::Store;
