//! Big-integer amount types for prices and quantities
//!
//! Token amounts are 256-bit unsigned integers at wei scale, so all
//! arithmetic is exact. Both types serialize as decimal strings to prevent
//! JSON number precision loss.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Price of one unit of base token, quoted in the quote token
///
/// A plain 256-bit integer; ordering on the raw value is the price
/// ordering used by the book's price index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(U256);

impl Price {
    /// Create a new Price from a raw U256
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    /// Zero price, the sentinel returned by empty-book queries
    pub fn zero() -> Self {
        Self(U256::ZERO)
    }

    /// Create from integer (for testing/convenience)
    pub fn from_u64(value: u64) -> Self {
        Self(U256::from(value))
    }

    /// Get the inner big integer
    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Check if the price is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = alloy_primitives::ruint::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(U256::from_str(s)?))
    }
}

// Serialized as decimal string to preserve precision
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let value = U256::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(Self(value))
    }
}

/// Remaining quantity of an order, or an aggregate volume
///
/// Quantities never go negative: `Sub` panics on underflow (a bookkeeping
/// bug, not a recoverable condition) and `checked_sub` is available where
/// the caller wants to decide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(U256);

impl Quantity {
    /// Create a new Quantity from a raw U256
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    /// Zero quantity
    pub fn zero() -> Self {
        Self(U256::ZERO)
    }

    /// Create from integer (for testing/convenience)
    pub fn from_u64(value: u64) -> Self {
        Self(U256::from(value))
    }

    /// Get the inner big integer
    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Check if quantity is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtraction returning None on underflow
    pub fn checked_sub(&self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "Quantity subtraction would underflow");
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = alloy_primitives::ruint::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(U256::from_str(s)?))
    }
}

// Serialized as decimal string to preserve precision
impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let value = U256::from_str(&s).map_err(serde::de::Error::custom)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_creation() {
        let price = Price::from_u64(50000);
        assert_eq!(price.as_u256(), U256::from(50000));
        assert!(!price.is_zero());
        assert!(Price::zero().is_zero());
    }

    #[test]
    fn test_price_ordering() {
        let low = Price::from_u64(100);
        let high = Price::from_u64(200);
        assert!(low < high);
        assert_eq!(low.max(high), high);
    }

    #[test]
    fn test_price_serialization() {
        let price = Price::from_str("340282366920938463463374607431768211456").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"340282366920938463463374607431768211456\"");

        let deserialized: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, deserialized);
    }

    #[test]
    fn test_quantity_arithmetic() {
        let q1 = Quantity::from_u64(25);
        let q2 = Quantity::from_u64(15);

        assert_eq!(q1 + q2, Quantity::from_u64(40));
        assert_eq!(q1 - q2, Quantity::from_u64(10));
    }

    #[test]
    #[should_panic(expected = "Quantity subtraction would underflow")]
    fn test_quantity_underflow_panics() {
        let _ = Quantity::from_u64(1) - Quantity::from_u64(2);
    }

    #[test]
    fn test_quantity_checked_sub() {
        let q1 = Quantity::from_u64(5);
        let q2 = Quantity::from_u64(8);

        assert_eq!(q2.checked_sub(q1), Some(Quantity::from_u64(3)));
        assert_eq!(q1.checked_sub(q2), None);
    }

    #[test]
    fn test_quantity_serialization() {
        let qty = Quantity::from_u64(1_000_000_000);
        let json = serde_json::to_string(&qty).unwrap();
        assert_eq!(json, "\"1000000000\"");

        let deserialized: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(qty, deserialized);
    }
}
