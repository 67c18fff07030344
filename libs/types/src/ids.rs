//! Identifier types for order book entities
//!
//! Order IDs are sequential per book (assigned from the book's monotonic
//! counter at insertion), so they double as time-priority evidence and as
//! storage-slot offsets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an order within one book
///
/// Assigned by the order book from its monotonic `next_order_id` counter;
/// never reused within a book. The decimal form is the canonical wire
/// representation and the storage-key offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(u64);

impl OrderId {
    /// Create an OrderId from a raw counter value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw counter value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Trading pair identifier in canonical lowercased form
///
/// Lowercasing happens at construction, so a pair named by a token
/// contract address compares equal regardless of the caller's hex casing.
/// The canonical form is what gets hashed into the book's storage slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairName(String);

impl PairName {
    /// Create a new PairName, lowercasing the input
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().to_lowercase())
    }

    /// Get the canonical pair string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PairName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_value() {
        let id = OrderId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_order_id_ordering() {
        assert!(OrderId::new(1) < OrderId::new(2));
        assert_eq!(OrderId::new(7), OrderId::from(7));
    }

    #[test]
    fn test_order_id_serialization() {
        let id = OrderId::new(1000);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "1000");

        let deserialized: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_pair_name_lowercases() {
        let pair = PairName::new("BTC/USDT");
        assert_eq!(pair.as_str(), "btc/usdt");
    }

    #[test]
    fn test_pair_name_address_form() {
        // Contract-address pair names must be casing-insensitive
        let a = PairName::new("0xAbCd/0xEF01");
        let b = PairName::new("0xabcd/0xef01");
        assert_eq!(a, b);
    }

    #[test]
    fn test_pair_name_serialization() {
        let pair = PairName::new("ETH/USDC");
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, "\"eth/usdc\"");

        let deserialized: PairName = serde_json::from_str(&json).unwrap();
        assert_eq!(pair, deserialized);
    }
}
