//! Per-price FIFO queue of resting orders
//!
//! Orders at one price form a doubly-linked list over the side's slab
//! arena. Insertion is always at the tail and matching always consumes
//! the head, which is what preserves time priority. All mutations are
//! O(1) repatches of arena keys.

use alloy_primitives::{B256, U256};
use slab::Slab;
use types::numeric::{Price, Quantity};
use types::order::Order;

/// Arena node: the order record plus its queue linkage
///
/// `prev`/`next`/`list` are slab keys. A node whose order reaches zero
/// quantity is unlinked and removed from the arena in the same operation.
#[derive(Debug, Clone)]
pub struct BookOrder {
    /// The order record itself
    pub item: Order,
    /// Pre-rebase storage key, derived from the order id
    pub key: B256,
    /// Previous (older) order at this price
    pub(crate) prev: Option<usize>,
    /// Next (newer) order at this price
    pub(crate) next: Option<usize>,
    /// Owning price list
    pub(crate) list: usize,
}

/// FIFO queue of orders at one price level
///
/// Holds only queue metadata and aggregates; order data lives in the
/// arena. `volume` is the sum of remaining quantities of linked orders.
#[derive(Debug, Clone)]
pub struct OrderList {
    price: Price,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    volume: Quantity,
    slot: U256,
    key: B256,
}

impl OrderList {
    /// Create a new empty list for `price` with its derived storage key
    /// and slot
    pub fn new(price: Price, key: B256, slot: U256) -> Self {
        Self {
            price,
            head: None,
            tail: None,
            len: 0,
            volume: Quantity::zero(),
            slot,
            key,
        }
    }

    /// Price of every order in this list
    pub fn price(&self) -> Price {
        self.price
    }

    /// Number of linked orders
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the list has no orders
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sum of remaining quantities of linked orders
    pub fn volume(&self) -> Quantity {
        self.volume
    }

    /// Storage key of this list
    pub fn key(&self) -> B256 {
        self.key
    }

    /// Slot under which this list's orders are stored
    pub fn slot(&self) -> U256 {
        self.slot
    }

    /// Oldest order, the next one to match
    pub fn head(&self) -> Option<usize> {
        self.head
    }

    /// Newest order
    pub fn tail(&self) -> Option<usize> {
        self.tail
    }

    /// Append an order at the tail (newest time priority)
    pub(crate) fn append(&mut self, idx: usize, orders: &mut Slab<BookOrder>) {
        let quantity = orders[idx].item.quantity;

        if self.len == 0 {
            orders[idx].prev = None;
            orders[idx].next = None;
            self.head = Some(idx);
            self.tail = Some(idx);
        } else {
            let tail = self.tail.expect("non-empty list has a tail");
            orders[idx].prev = Some(tail);
            orders[idx].next = None;
            orders[tail].next = Some(idx);
            self.tail = Some(idx);
        }

        self.len += 1;
        self.volume = self.volume + quantity;
    }

    /// Unlink an order, repatching its neighbors
    ///
    /// The removed node's own links are left as-is; the caller drops the
    /// node from the arena right after, so they must not be reused.
    pub(crate) fn remove(&mut self, idx: usize, orders: &mut Slab<BookOrder>) {
        let quantity = orders[idx].item.quantity;
        self.volume = self.volume - quantity;
        self.len -= 1;

        if self.len == 0 {
            self.head = None;
            self.tail = None;
            return;
        }

        let prev = orders[idx].prev;
        let next = orders[idx].next;

        match (prev, next) {
            (Some(p), Some(n)) => {
                orders[n].prev = Some(p);
                orders[p].next = Some(n);
            }
            (None, Some(n)) => {
                orders[n].prev = None;
                self.head = Some(n);
            }
            (Some(p), None) => {
                orders[p].next = None;
                self.tail = Some(p);
            }
            (None, None) => unreachable!("sole order handled by the len == 0 branch"),
        }
    }

    /// Move an order to the tail, forfeiting its time priority
    ///
    /// No-op when the order already is the tail.
    pub(crate) fn move_to_tail(&mut self, idx: usize, orders: &mut Slab<BookOrder>) {
        if self.tail == Some(idx) {
            return;
        }

        let prev = orders[idx].prev;
        let next = orders[idx].next.expect("non-tail order has a successor");

        match prev {
            Some(p) => orders[p].next = Some(next),
            None => self.head = Some(next),
        }
        orders[next].prev = prev;

        let tail = self.tail.expect("non-empty list has a tail");
        orders[tail].next = Some(idx);
        orders[idx].prev = Some(tail);
        orders[idx].next = None;
        self.tail = Some(idx);
    }

    /// Replace an order's remaining quantity
    ///
    /// An increase relocates the order to the tail (new time priority); a
    /// decrease, as happens on partial fills, keeps its position. The
    /// list volume absorbs the signed delta.
    pub(crate) fn update_quantity(
        &mut self,
        idx: usize,
        new_quantity: Quantity,
        timestamp: u64,
        orders: &mut Slab<BookOrder>,
    ) {
        let old_quantity = orders[idx].item.quantity;

        if new_quantity > old_quantity && self.tail != Some(idx) {
            self.move_to_tail(idx, orders);
        }

        if new_quantity >= old_quantity {
            self.volume = self.volume + (new_quantity - old_quantity);
        } else {
            self.volume = self.volume - (old_quantity - new_quantity);
        }

        orders[idx].item.quantity = new_quantity;
        orders[idx].item.updated_at = timestamp;
    }
}
