//! Order record and lifecycle enums
//!
//! An `Order` is the plain data record an external submitter hands to the
//! book. Book position (list membership, neighbor links) is tracked by the
//! matching engine, not here, so the record itself is cycle-free and
//! serializes directly.

use crate::ids::{OrderId, PairName};
use crate::numeric::{Price, Quantity};
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order side (buyer or seller)
///
/// Wire strings are `"BUY"` / `"SELL"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Canonical wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

/// Order kind: immediate execution against the book, or priced
///
/// Wire strings are `"market"` / `"limit"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    #[serde(rename = "market")]
    Market,
    #[serde(rename = "limit")]
    Limit,
}

impl OrderKind {
    /// Canonical wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Market => "market",
            OrderKind::Limit => "limit",
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "market" => Ok(OrderKind::Market),
            "limit" => Ok(OrderKind::Limit),
            other => Err(format!("unknown order kind: {other}")),
        }
    }
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "NEW")]
    New,
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "PARTIAL_FILLED")]
    PartialFilled,
    #[serde(rename = "FILLED")]
    Filled,
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    /// Canonical wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Open => "OPEN",
            OrderStatus::PartialFilled => "PARTIAL_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(OrderStatus::New),
            "OPEN" => Ok(OrderStatus::Open),
            "PARTIAL_FILLED" => Ok(OrderStatus::PartialFilled),
            "FILLED" => Ok(OrderStatus::Filled),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Secp256k1 signature attached by the submitter
///
/// Recorded and round-tripped through storage; signature validation is the
/// messaging layer's job, never the matcher's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

/// A single resting or incoming order
///
/// `quantity` is the remaining (unfilled) amount; the book unlinks an
/// order the moment it reaches zero. Timestamps are seconds since epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub hash: B256,
    pub user_address: Address,
    pub exchange_address: Address,
    pub base_token: Address,
    pub quote_token: Address,
    pub pair_name: PairName,
    pub price: Price,
    pub quantity: Quantity,
    pub filled_amount: Quantity,
    pub side: Side,
    pub kind: OrderKind,
    pub status: OrderStatus,
    pub make_fee: U256,
    pub take_fee: U256,
    pub nonce: U256,
    pub signature: Option<Signature>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Order {
    /// Create a new order with the economically relevant fields set
    ///
    /// Identity and fee fields default to zero; the submitter fills them
    /// in before signing, and the book assigns `order_id` at insertion.
    pub fn new(
        pair_name: PairName,
        side: Side,
        kind: OrderKind,
        price: Price,
        quantity: Quantity,
        user_address: Address,
        timestamp: u64,
    ) -> Self {
        Self {
            order_id: OrderId::default(),
            hash: B256::ZERO,
            user_address,
            exchange_address: Address::ZERO,
            base_token: Address::ZERO,
            quote_token: Address::ZERO,
            pair_name,
            price,
            quantity,
            filled_amount: Quantity::zero(),
            side,
            kind,
            status: OrderStatus::New,
            make_fee: U256::ZERO,
            take_fee: U256::ZERO,
            nonce: U256::ZERO,
            signature: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order::new(
            PairName::new("BTC/USDT"),
            Side::Buy,
            OrderKind::Limit,
            Price::from_u64(100),
            Quantity::from_u64(5),
            Address::repeat_byte(0x11),
            1_700_000_000,
        )
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_side_wire_strings() {
        assert_eq!(Side::Buy.as_str(), "BUY");
        assert_eq!(Side::Sell.as_str(), "SELL");
        assert_eq!("SELL".parse::<Side>().unwrap(), Side::Sell);
        assert!("sell".parse::<Side>().is_err());
    }

    #[test]
    fn test_order_kind_wire_strings() {
        assert_eq!(OrderKind::Market.as_str(), "market");
        assert_eq!(OrderKind::Limit.as_str(), "limit");
        assert_eq!("market".parse::<OrderKind>().unwrap(), OrderKind::Market);
    }

    #[test]
    fn test_order_status_cancelled_string() {
        assert_eq!(OrderStatus::Cancelled.as_str(), "CANCELLED");
        assert_eq!(
            "CANCELLED".parse::<OrderStatus>().unwrap(),
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn test_order_creation_defaults() {
        let order = sample_order();
        assert_eq!(order.order_id, OrderId::default());
        assert_eq!(order.status, OrderStatus::New);
        assert!(order.filled_amount.is_zero());
        assert!(order.signature.is_none());
        assert_eq!(order.created_at, order.updated_at);
    }

    #[test]
    fn test_order_serialization() {
        let order = sample_order();
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
        assert!(json.contains("\"BUY\""));
        assert!(json.contains("\"limit\""));
    }
}
