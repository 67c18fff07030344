//! Cycle-breaking persistence codec
//!
//! Live entities reference each other in cycles (order ↔ list ↔ tree), so
//! each gets a flat store shape whose neighbor relations are reduced to
//! storage-key references. References are RLP byte strings where the
//! empty string means "absent". The field order of every record is part
//! of the wire contract; reordering fields is a breaking change.
//!
//! The tree record snapshots its three indices as JSON maps emitted from
//! `BTreeMap`, so encoding is byte-deterministic for identical state.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::{Decodable, RlpDecodable, RlpEncodable};
use std::collections::BTreeMap;
use std::str::FromStr;
use types::errors::CodecError;
use types::ids::{OrderId, PairName};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, OrderStatus, Side, Signature};

/// Store shape of an order
///
/// Mirrors `Order` field-for-field, with enums as wire strings, the
/// signature packed as `r ++ s ++ v` (empty when unsigned), and the
/// queue linkage flattened to storage-key references.
#[derive(Debug, Clone, PartialEq, RlpEncodable, RlpDecodable)]
pub struct OrderRecord {
    pub order_id: u64,
    pub hash: B256,
    pub user_address: Address,
    pub exchange_address: Address,
    pub base_token: Address,
    pub quote_token: Address,
    pub pair_name: String,
    pub price: U256,
    pub quantity: U256,
    pub filled_amount: U256,
    pub side: String,
    pub kind: String,
    pub status: String,
    pub make_fee: U256,
    pub take_fee: U256,
    pub nonce: U256,
    pub signature: Bytes,
    pub created_at: u64,
    pub updated_at: u64,
    pub key: B256,
    pub prev_order: Bytes,
    pub next_order: Bytes,
    pub order_list: Bytes,
}

/// Store shape of a price list
///
/// `head`, `tail`, and `last_order` are storage-key references into the
/// list's own slot namespace.
#[derive(Debug, Clone, PartialEq, RlpEncodable, RlpDecodable)]
pub struct OrderListRecord {
    pub price: U256,
    pub len: u64,
    pub volume: U256,
    pub head: Bytes,
    pub tail: Bytes,
    pub last_order: Bytes,
    pub slot: U256,
    pub key: B256,
}

/// Store shape of one book side
///
/// The live price tree and maps are replaced by JSON snapshots
/// (`price → list key` and `order id → order storage key`) plus the
/// scalar aggregates; restore rebuilds the live structures from them.
#[derive(Debug, Clone, PartialEq, RlpEncodable, RlpDecodable)]
pub struct OrderTreeRecord {
    pub price_tree: Bytes,
    pub price_map: Bytes,
    pub order_map: Bytes,
    pub volume: U256,
    pub num_orders: u64,
    pub depth: u64,
    pub slot: U256,
    pub key: B256,
}

/// Store shape of a whole book; the two trees embed as their store forms
#[derive(Debug, Clone, PartialEq, RlpEncodable, RlpDecodable)]
pub struct OrderBookRecord {
    pub pair_name: String,
    pub time: u64,
    pub next_order_id: u64,
    pub key: B256,
    pub slot: U256,
    pub bids: OrderTreeRecord,
    pub asks: OrderTreeRecord,
}

/// Entity discriminant, the codec's type hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Order,
    OrderList,
    OrderTree,
    OrderBook,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Order => "Order",
            EntityKind::OrderList => "OrderList",
            EntityKind::OrderTree => "OrderTree",
            EntityKind::OrderBook => "OrderBook",
        }
    }
}

impl FromStr for EntityKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Order" => Ok(EntityKind::Order),
            "OrderList" => Ok(EntityKind::OrderList),
            "OrderTree" => Ok(EntityKind::OrderTree),
            "OrderBook" => Ok(EntityKind::OrderBook),
            other => Err(CodecError::UnsupportedType(other.to_string())),
        }
    }
}

/// A decoded entity, tagged by kind
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Order(OrderRecord),
    OrderList(OrderListRecord),
    OrderTree(OrderTreeRecord),
    OrderBook(OrderBookRecord),
}

// ── Encode / decode ─────────────────────────────────────────────────

pub fn encode_order(record: &OrderRecord) -> Vec<u8> {
    alloy_rlp::encode(record)
}

pub fn encode_order_list(record: &OrderListRecord) -> Vec<u8> {
    alloy_rlp::encode(record)
}

pub fn encode_order_tree(record: &OrderTreeRecord) -> Vec<u8> {
    alloy_rlp::encode(record)
}

pub fn encode_order_book(record: &OrderBookRecord) -> Vec<u8> {
    alloy_rlp::encode(record)
}

pub fn decode_order(mut bytes: &[u8]) -> Result<OrderRecord, CodecError> {
    OrderRecord::decode(&mut bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

pub fn decode_order_list(mut bytes: &[u8]) -> Result<OrderListRecord, CodecError> {
    OrderListRecord::decode(&mut bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

pub fn decode_order_tree(mut bytes: &[u8]) -> Result<OrderTreeRecord, CodecError> {
    OrderTreeRecord::decode(&mut bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

pub fn decode_order_book(mut bytes: &[u8]) -> Result<OrderBookRecord, CodecError> {
    OrderBookRecord::decode(&mut bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Decode bytes as the entity named by `kind`
pub fn decode_entity(kind: EntityKind, bytes: &[u8]) -> Result<Entity, CodecError> {
    match kind {
        EntityKind::Order => decode_order(bytes).map(Entity::Order),
        EntityKind::OrderList => decode_order_list(bytes).map(Entity::OrderList),
        EntityKind::OrderTree => decode_order_tree(bytes).map(Entity::OrderTree),
        EntityKind::OrderBook => decode_order_book(bytes).map(Entity::OrderBook),
    }
}

// ── Record conversions ──────────────────────────────────────────────

/// Flatten an order into its store shape
///
/// `prev`, `next`, and `list` are the already-rebased storage keys of the
/// neighbors and the owning list; pass empty bytes where there is none.
pub fn order_to_record(
    order: &Order,
    key: B256,
    prev: Bytes,
    next: Bytes,
    list: Bytes,
) -> OrderRecord {
    let signature = match &order.signature {
        Some(sig) => {
            let mut buf = Vec::with_capacity(65);
            buf.extend_from_slice(sig.r.as_slice());
            buf.extend_from_slice(sig.s.as_slice());
            buf.push(sig.v);
            Bytes::from(buf)
        }
        None => Bytes::new(),
    };

    OrderRecord {
        order_id: order.order_id.value(),
        hash: order.hash,
        user_address: order.user_address,
        exchange_address: order.exchange_address,
        base_token: order.base_token,
        quote_token: order.quote_token,
        pair_name: order.pair_name.as_str().to_string(),
        price: order.price.as_u256(),
        quantity: order.quantity.as_u256(),
        filled_amount: order.filled_amount.as_u256(),
        side: order.side.as_str().to_string(),
        kind: order.kind.as_str().to_string(),
        status: order.status.as_str().to_string(),
        make_fee: order.make_fee,
        take_fee: order.take_fee,
        nonce: order.nonce,
        signature,
        created_at: order.created_at,
        updated_at: order.updated_at,
        key,
        prev_order: prev,
        next_order: next,
        order_list: list,
    }
}

/// Rebuild a live order from its store shape
pub fn order_from_record(record: &OrderRecord) -> Result<Order, CodecError> {
    let side = Side::from_str(&record.side).map_err(CodecError::Decode)?;
    let kind = OrderKind::from_str(&record.kind).map_err(CodecError::Decode)?;
    let status = OrderStatus::from_str(&record.status).map_err(CodecError::Decode)?;

    let signature = match record.signature.len() {
        0 => None,
        65 => Some(Signature {
            r: B256::from_slice(&record.signature[..32]),
            s: B256::from_slice(&record.signature[32..64]),
            v: record.signature[64],
        }),
        n => {
            return Err(CodecError::Decode(format!(
                "signature must be empty or 65 bytes, got {n}"
            )))
        }
    };

    Ok(Order {
        order_id: OrderId::new(record.order_id),
        hash: record.hash,
        user_address: record.user_address,
        exchange_address: record.exchange_address,
        base_token: record.base_token,
        quote_token: record.quote_token,
        pair_name: PairName::new(record.pair_name.clone()),
        price: Price::new(record.price),
        quantity: Quantity::new(record.quantity),
        filled_amount: Quantity::new(record.filled_amount),
        side,
        kind,
        status,
        make_fee: record.make_fee,
        take_fee: record.take_fee,
        nonce: record.nonce,
        signature,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

// ── Index snapshots ─────────────────────────────────────────────────

/// Serialize an index snapshot; `BTreeMap` keeps key order deterministic
pub fn encode_snapshot(map: &BTreeMap<String, String>) -> Result<Bytes, CodecError> {
    serde_json::to_vec(map)
        .map(Bytes::from)
        .map_err(|e| CodecError::Snapshot(e.to_string()))
}

/// Parse an index snapshot back into its map form
pub fn decode_snapshot(bytes: &[u8]) -> Result<BTreeMap<String, String>, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Snapshot(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        let mut order = Order::new(
            PairName::new("BTC/USDT"),
            Side::Buy,
            OrderKind::Limit,
            Price::from_u64(100),
            Quantity::from_u64(5),
            Address::repeat_byte(0x11),
            1_700_000_000,
        );
        order.order_id = OrderId::new(9);
        order.nonce = U256::from(3);
        order
    }

    #[test]
    fn test_order_record_roundtrip() {
        let order = sample_order();
        let record = order_to_record(
            &order,
            B256::repeat_byte(0x01),
            Bytes::new(),
            Bytes::from(vec![0x22; 32]),
            Bytes::from(vec![0x33; 32]),
        );

        let bytes = encode_order(&record);
        let decoded = decode_order(&bytes).unwrap();
        assert_eq!(record, decoded);

        let rebuilt = order_from_record(&decoded).unwrap();
        assert_eq!(rebuilt, order);
    }

    #[test]
    fn test_order_record_signature_roundtrip() {
        let mut order = sample_order();
        order.signature = Some(Signature {
            v: 27,
            r: B256::repeat_byte(0x0a),
            s: B256::repeat_byte(0x0b),
        });

        let record = order_to_record(&order, B256::ZERO, Bytes::new(), Bytes::new(), Bytes::new());
        assert_eq!(record.signature.len(), 65);

        let rebuilt = order_from_record(&record).unwrap();
        assert_eq!(rebuilt.signature, order.signature);
    }

    #[test]
    fn test_order_record_bad_signature_length() {
        let order = sample_order();
        let mut record =
            order_to_record(&order, B256::ZERO, Bytes::new(), Bytes::new(), Bytes::new());
        record.signature = Bytes::from(vec![0u8; 10]);

        assert!(matches!(
            order_from_record(&record),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn test_order_record_unknown_side() {
        let order = sample_order();
        let mut record =
            order_to_record(&order, B256::ZERO, Bytes::new(), Bytes::new(), Bytes::new());
        record.side = "HOLD".to_string();

        assert!(order_from_record(&record).is_err());
    }

    #[test]
    fn test_order_list_record_roundtrip() {
        let record = OrderListRecord {
            price: U256::from(100),
            len: 2,
            volume: U256::from(30),
            head: Bytes::from(vec![0x01; 32]),
            tail: Bytes::from(vec![0x02; 32]),
            last_order: Bytes::from(vec![0x02; 32]),
            slot: U256::from(77),
            key: B256::repeat_byte(0x05),
        };

        let decoded = decode_order_list(&encode_order_list(&record)).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn test_tree_record_roundtrip_with_snapshots() {
        let mut prices = BTreeMap::new();
        prices.insert("100".to_string(), B256::repeat_byte(0x01).to_string());
        prices.insert("90".to_string(), B256::repeat_byte(0x02).to_string());
        let snapshot = encode_snapshot(&prices).unwrap();

        let record = OrderTreeRecord {
            price_tree: snapshot.clone(),
            price_map: snapshot.clone(),
            order_map: encode_snapshot(&BTreeMap::new()).unwrap(),
            volume: U256::from(42),
            num_orders: 3,
            depth: 2,
            slot: U256::from(9),
            key: B256::repeat_byte(0x07),
        };

        let decoded = decode_order_tree(&encode_order_tree(&record)).unwrap();
        assert_eq!(record, decoded);

        let restored = decode_snapshot(&decoded.price_map).unwrap();
        assert_eq!(restored, prices);
    }

    #[test]
    fn test_snapshot_encoding_deterministic() {
        let mut a = BTreeMap::new();
        a.insert("200".to_string(), "x".to_string());
        a.insert("100".to_string(), "y".to_string());

        let mut b = BTreeMap::new();
        b.insert("100".to_string(), "y".to_string());
        b.insert("200".to_string(), "x".to_string());

        assert_eq!(encode_snapshot(&a).unwrap(), encode_snapshot(&b).unwrap());
    }

    #[test]
    fn test_entity_kind_type_hint() {
        assert_eq!("Order".parse::<EntityKind>().unwrap(), EntityKind::Order);
        assert!(matches!(
            "Mempool".parse::<EntityKind>(),
            Err(CodecError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_decode_entity_tagged() {
        let record = OrderListRecord {
            price: U256::from(1),
            len: 0,
            volume: U256::ZERO,
            head: Bytes::new(),
            tail: Bytes::new(),
            last_order: Bytes::new(),
            slot: U256::ZERO,
            key: B256::ZERO,
        };
        let bytes = encode_order_list(&record);

        match decode_entity(EntityKind::OrderList, &bytes).unwrap() {
            Entity::OrderList(decoded) => assert_eq!(decoded, record),
            other => panic!("unexpected entity: {other:?}"),
        }
    }

    #[test]
    fn test_decode_corrupt_bytes() {
        assert!(matches!(
            decode_order(&[0xff, 0x00, 0x01]),
            Err(CodecError::Decode(_))
        ));
    }
}
