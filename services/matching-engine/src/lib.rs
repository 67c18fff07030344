//! Matching Engine
//!
//! Price-time priority limit order book for one trading pair, backed by a
//! pluggable key-value store.
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced (better price first, FIFO
//!   within a price, partial fills never reorder)
//! - Aggregates stay consistent: `depth`, `num_orders`, and `volume`
//!   always equal what the price lists sum to
//! - Every mutation persists the affected entities before the operation
//!   returns
//!
//! The book is single-threaded cooperative: callers serialize operations
//! against one book; books sharing a concurrent-safe store may run in
//! parallel.

pub mod book;
pub mod codec;
pub mod orderbook;
pub mod slots;

pub use orderbook::OrderBook;
