//! Deterministic storage key derivation
//!
//! Every persisted entity gets a collision-free key derived from the
//! book's keccak slot:
//!
//! ```text
//! book key       = keccak256(lowercase(pair_name))
//! side key       = book key with the byte at SLOT_SEGMENT bumped by the
//!                  side index (1 = bids, 2 = asks)
//! price-list key = bytes32(side_slot + price)
//! price-list slot = keccak256(price-list key)
//! order key      = bytes32(order_id)
//! order storage key = bytes32(list_slot + order_slot)
//! ```
//!
//! The side bump sits at the address-length boundary, far enough into the
//! hash that the two sides and all price offsets under them never overlap.

use alloy_primitives::{keccak256, B256, U256};
use types::ids::OrderId;
use types::numeric::Price;

/// Byte offset used to segment one keccak slot into side namespaces
pub const SLOT_SEGMENT: usize = 20;

/// Segment index of the bid side
pub const BID_SEGMENT: u8 = 1;

/// Segment index of the ask side
pub const ASK_SEGMENT: u8 = 2;

/// Storage key of a book: keccak of the canonical (lowercased) pair name
pub fn book_key(pair_name: &str) -> B256 {
    keccak256(pair_name.to_lowercase().as_bytes())
}

/// Derive a side key by bumping the byte at the segment boundary
pub fn segment_hash(key: B256, segment: u8) -> B256 {
    let mut out = key;
    out[SLOT_SEGMENT] = out[SLOT_SEGMENT].wrapping_add(segment);
    out
}

/// Interpret a 32-byte key as a big-integer slot
pub fn slot_from_key(key: B256) -> U256 {
    U256::from_be_bytes(key.0)
}

/// 32-byte big-endian form of a slot value
pub fn key_from_u256(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

/// Storage key of the price list at `price` under a side slot
pub fn price_list_key(side_slot: U256, price: Price) -> B256 {
    key_from_u256(side_slot.wrapping_add(price.as_u256()))
}

/// Slot of a price list, rehashed so per-order offsets cannot collide
/// with neighboring lists
pub fn price_list_slot(list_key: B256) -> U256 {
    slot_from_key(keccak256(list_key))
}

/// Key of an order before rebasing into its list's namespace
pub fn order_key(order_id: OrderId) -> B256 {
    key_from_u256(U256::from(order_id.value()))
}

/// Final storage key of an order linked into a list
pub fn order_storage_key(list_slot: U256, order_key: B256) -> B256 {
    key_from_u256(list_slot.wrapping_add(slot_from_key(order_key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_key_case_insensitive() {
        assert_eq!(book_key("BTC/USDT"), book_key("btc/usdt"));
        assert_ne!(book_key("btc/usdt"), book_key("eth/usdt"));
    }

    #[test]
    fn test_segment_hash_distinct_sides() {
        let key = book_key("btc/usdt");
        let bids = segment_hash(key, BID_SEGMENT);
        let asks = segment_hash(key, ASK_SEGMENT);

        assert_ne!(bids, asks);
        assert_ne!(bids, key);
        assert_ne!(asks, key);
        // Only the segment byte differs from the book key
        assert_eq!(&bids[..SLOT_SEGMENT], &key[..SLOT_SEGMENT]);
        assert_eq!(&bids[SLOT_SEGMENT + 1..], &key[SLOT_SEGMENT + 1..]);
    }

    #[test]
    fn test_key_slot_roundtrip() {
        let key = book_key("btc/usdt");
        assert_eq!(key_from_u256(slot_from_key(key)), key);
    }

    #[test]
    fn test_price_list_keys_disjoint_across_prices() {
        let side_slot = slot_from_key(segment_hash(book_key("btc/usdt"), BID_SEGMENT));
        let a = price_list_key(side_slot, Price::from_u64(100));
        let b = price_list_key(side_slot, Price::from_u64(101));
        assert_ne!(a, b);
    }

    #[test]
    fn test_order_storage_key_rebased_per_list() {
        let side_slot = slot_from_key(segment_hash(book_key("btc/usdt"), BID_SEGMENT));
        let list_a = price_list_slot(price_list_key(side_slot, Price::from_u64(100)));
        let list_b = price_list_slot(price_list_key(side_slot, Price::from_u64(200)));
        let key = order_key(OrderId::new(7));

        // The same order id maps to different storage keys under
        // different lists
        assert_ne!(order_storage_key(list_a, key), order_storage_key(list_b, key));
    }

    #[test]
    fn test_order_key_is_id_offset() {
        let key = order_key(OrderId::new(5));
        assert_eq!(slot_from_key(key), U256::from(5));
    }
}
