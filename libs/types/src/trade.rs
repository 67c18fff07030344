//! Trade execution records
//!
//! A trade is emitted for every slice of liquidity the matcher consumes.
//! The wire form stringifies every field, and carries the execution time
//! twice (`timestamp` and `time`) for compatibility with downstream
//! consumers that read either name.

use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One executed trade
///
/// `price` is the resting (maker) order's price; `timestamp` and `time`
/// are the book clock at submission of the taker order, always equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(with = "u64_string")]
    pub timestamp: u64,
    pub price: Price,
    pub quantity: Quantity,
    #[serde(with = "u64_string")]
    pub time: u64,
}

impl Trade {
    /// Create a trade record, duplicating the timestamp into `time`
    pub fn new(timestamp: u64, price: Price, quantity: Quantity) -> Self {
        Self {
            timestamp,
            price,
            quantity,
            time: timestamp,
        }
    }

    /// Flatten to the map-of-decimal-strings wire form
    pub fn to_record(&self) -> BTreeMap<String, String> {
        let mut record = BTreeMap::new();
        record.insert("timestamp".to_string(), self.timestamp.to_string());
        record.insert("price".to_string(), self.price.to_string());
        record.insert("quantity".to_string(), self.quantity.to_string());
        record.insert("time".to_string(), self.time.to_string());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_duplicated_timestamp() {
        let trade = Trade::new(1_700_000_000, Price::from_u64(100), Quantity::from_u64(3));
        assert_eq!(trade.timestamp, trade.time);
    }

    #[test]
    fn test_trade_record_stringified() {
        let trade = Trade::new(1_700_000_000, Price::from_u64(100), Quantity::from_u64(3));
        let record = trade.to_record();

        assert_eq!(record["timestamp"], "1700000000");
        assert_eq!(record["price"], "100");
        assert_eq!(record["quantity"], "3");
        assert_eq!(record["time"], "1700000000");
    }

    #[test]
    fn test_trade_serialization_all_strings() {
        let trade = Trade::new(1_700_000_000, Price::from_u64(100), Quantity::from_u64(3));
        let json = serde_json::to_string(&trade).unwrap();
        assert_eq!(
            json,
            "{\"timestamp\":\"1700000000\",\"price\":\"100\",\"quantity\":\"3\",\"time\":\"1700000000\"}"
        );

        let deserialized: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deserialized);
    }
}
