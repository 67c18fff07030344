//! One side of an order book
//!
//! Price levels are indexed twice on purpose: `price_tree` (a `BTreeMap`)
//! answers best/worst price queries, `price_map` gives O(1) lookup by
//! price, and both always hold the same key set. `create_price` /
//! `remove_price` are the only mutators of either, which is what keeps
//! them in lockstep. Orders themselves live in a slab arena; `order_map`
//! resolves an order id to its arena key for O(1) cancel and modify.
//!
//! Every mutation persists the entities it touched (order, neighbors
//! whose links changed, list, tree) in one store batch.

use alloy_primitives::{Bytes, B256, U256};
use persistence::Store;
use slab::Slab;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};
use types::errors::{BookError, CodecError};
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Order;

use crate::book::order_list::{BookOrder, OrderList};
use crate::codec::{self, OrderListRecord, OrderRecord, OrderTreeRecord};
use crate::slots;

/// Price-indexed collection of order lists for one side
pub struct OrderTree {
    /// Ordered price index; values are list arena keys
    price_tree: BTreeMap<Price, usize>,
    /// O(1) price lookup, same key set as `price_tree`
    price_map: HashMap<Price, usize>,
    /// O(1) order lookup by id
    order_map: HashMap<OrderId, usize>,
    /// Arena of price lists
    lists: Slab<OrderList>,
    /// Arena of resting orders
    orders: Slab<BookOrder>,
    /// Total remaining quantity across all lists
    volume: Quantity,
    /// Count of resting orders
    num_orders: u64,
    /// Count of distinct prices
    depth: u64,
    slot: U256,
    key: B256,
    store: Arc<dyn Store>,
}

impl OrderTree {
    /// Create an empty tree persisting under `key`
    pub fn new(key: B256, store: Arc<dyn Store>) -> Self {
        Self {
            price_tree: BTreeMap::new(),
            price_map: HashMap::new(),
            order_map: HashMap::new(),
            lists: Slab::new(),
            orders: Slab::new(),
            volume: Quantity::zero(),
            num_orders: 0,
            depth: 0,
            slot: slots::slot_from_key(key),
            key,
            store,
        }
    }

    /// Number of resting orders
    pub fn len(&self) -> usize {
        self.order_map.len()
    }

    /// Check if the side holds no orders
    pub fn is_empty(&self) -> bool {
        self.order_map.is_empty()
    }

    /// Total remaining quantity across all price levels
    pub fn volume(&self) -> Quantity {
        self.volume
    }

    /// Count of resting orders (aggregate counter)
    pub fn num_orders(&self) -> u64 {
        self.num_orders
    }

    /// Number of distinct prices with at least one order
    pub fn depth(&self) -> u64 {
        self.depth
    }

    /// Storage key of this side
    pub fn key(&self) -> B256 {
        self.key
    }

    /// Slot from which price-list keys are derived
    pub fn slot(&self) -> U256 {
        self.slot
    }

    /// Look up a resting order by id
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.order_map
            .get(&order_id)
            .map(|&idx| &self.orders[idx].item)
    }

    /// Check if an order id is resting on this side
    pub fn order_exists(&self, order_id: OrderId) -> bool {
        self.order_map.contains_key(&order_id)
    }

    /// Check if a price level exists
    pub fn price_exists(&self, price: Price) -> bool {
        self.price_map.contains_key(&price)
    }

    /// The list at `price`, if the level exists
    pub fn price_list(&self, price: Price) -> Option<&OrderList> {
        self.price_map.get(&price).map(|&idx| &self.lists[idx])
    }

    /// All prices with at least one order, ascending
    pub fn prices(&self) -> Vec<Price> {
        self.price_tree.keys().copied().collect()
    }

    /// Orders at `price` in queue (time-priority) order
    pub fn orders_at(&self, price: Price) -> Vec<&Order> {
        let mut out = Vec::new();
        if let Some(&list_idx) = self.price_map.get(&price) {
            let mut cursor = self.lists[list_idx].head();
            while let Some(idx) = cursor {
                out.push(&self.orders[idx].item);
                cursor = self.orders[idx].next;
            }
        }
        out
    }

    /// Highest price, or zero when the side is empty
    pub fn max_price(&self) -> Price {
        self.price_tree
            .keys()
            .next_back()
            .copied()
            .unwrap_or_else(Price::zero)
    }

    /// Lowest price, or zero when the side is empty
    pub fn min_price(&self) -> Price {
        self.price_tree
            .keys()
            .next()
            .copied()
            .unwrap_or_else(Price::zero)
    }

    /// List at the highest price
    pub fn max_price_list(&self) -> Option<&OrderList> {
        self.max_price_list_idx().map(|idx| &self.lists[idx])
    }

    /// List at the lowest price
    pub fn min_price_list(&self) -> Option<&OrderList> {
        self.min_price_list_idx().map(|idx| &self.lists[idx])
    }

    pub(crate) fn max_price_list_idx(&self) -> Option<usize> {
        self.price_tree.values().next_back().copied()
    }

    pub(crate) fn min_price_list_idx(&self) -> Option<usize> {
        self.price_tree.values().next().copied()
    }

    /// Length of the list at `list_idx`; zero once the level is gone
    pub(crate) fn list_len_at(&self, list_idx: usize) -> usize {
        self.lists.get(list_idx).map(|l| l.len()).unwrap_or(0)
    }

    /// Head order of the list at `list_idx`
    pub(crate) fn head_at(&self, list_idx: usize) -> Option<usize> {
        self.lists.get(list_idx).and_then(|l| l.head())
    }

    /// Order record at an arena key
    pub(crate) fn order_at(&self, order_idx: usize) -> &Order {
        &self.orders[order_idx].item
    }

    // ── Mutation ────────────────────────────────────────────────────

    /// Admit an order at its price level and persist it
    ///
    /// An id already resting is first removed, so a re-insert can never
    /// double-account volume. The order's storage key derives from its
    /// id, rebased into the list's slot.
    pub fn insert_order(&mut self, order: Order) -> Result<(), BookError> {
        let order_id = order.order_id;
        if self.order_map.contains_key(&order_id) {
            self.remove_order_by_id(order_id)?;
        }
        self.num_orders += 1;

        let price = order.price;
        if !self.price_map.contains_key(&price) {
            self.create_price(price);
        }
        let list_idx = self.price_map[&price];
        let prev_tail = self.lists[list_idx].tail();

        let quantity = order.quantity;
        let key = slots::order_key(order_id);
        let order_idx = self.orders.insert(BookOrder {
            item: order,
            key,
            prev: None,
            next: None,
            list: list_idx,
        });
        self.lists[list_idx].append(order_idx, &mut self.orders);
        self.order_map.insert(order_id, order_idx);
        self.volume = self.volume + quantity;

        // The previous tail's next-link changed, so it re-persists too
        let mut dirty = vec![order_idx];
        if let Some(tail_idx) = prev_tail {
            dirty.push(tail_idx);
        }
        self.persist_list(list_idx, &dirty)
    }

    /// Unlink an order and return its record
    ///
    /// Removing the last order of a level drops the price from both
    /// indices. Absent ids return `Ok(None)`.
    pub fn remove_order_by_id(&mut self, order_id: OrderId) -> Result<Option<Order>, BookError> {
        let Some(&order_idx) = self.order_map.get(&order_id) else {
            return Ok(None);
        };

        self.num_orders -= 1;
        let quantity = self.orders[order_idx].item.quantity;
        self.volume = self.volume - quantity;

        let list_idx = self.orders[order_idx].list;
        let prev = self.orders[order_idx].prev;
        let next = self.orders[order_idx].next;

        self.lists[list_idx].remove(order_idx, &mut self.orders);
        let node = self.orders.remove(order_idx);
        self.order_map.remove(&order_id);

        if self.lists[list_idx].is_empty() {
            self.remove_price(node.item.price);
            self.save()?;
        } else {
            let mut dirty = Vec::new();
            if let Some(p) = prev {
                dirty.push(p);
            }
            if let Some(n) = next {
                dirty.push(n);
            }
            self.persist_list(list_idx, &dirty)?;
        }
        Ok(Some(node.item))
    }

    /// Apply an order update
    ///
    /// A price change is a remove + re-insert (the order loses its time
    /// priority); a quantity-only change adjusts in place, relocating to
    /// the tail only on increase. Unknown ids are ignored.
    pub fn update_order(&mut self, update: Order) -> Result<(), BookError> {
        let Some(&order_idx) = self.order_map.get(&update.order_id) else {
            return Ok(());
        };

        let existing_price = self.orders[order_idx].item.price;
        if update.price != existing_price {
            self.remove_order_by_id(update.order_id)?;
            self.insert_order(update)
        } else {
            self.update_order_quantity(update.order_id, update.quantity, update.updated_at)
        }
    }

    /// Replace a resting order's remaining quantity
    ///
    /// The tree volume absorbs the signed delta so it stays equal to the
    /// sum of list volumes.
    pub fn update_order_quantity(
        &mut self,
        order_id: OrderId,
        new_quantity: Quantity,
        timestamp: u64,
    ) -> Result<(), BookError> {
        let Some(&order_idx) = self.order_map.get(&order_id) else {
            return Ok(());
        };

        let list_idx = self.orders[order_idx].list;
        let old_quantity = self.orders[order_idx].item.quantity;
        let will_move =
            new_quantity > old_quantity && self.lists[list_idx].tail() != Some(order_idx);
        let prev = self.orders[order_idx].prev;
        let next = self.orders[order_idx].next;
        let old_tail = self.lists[list_idx].tail();

        self.lists[list_idx].update_quantity(order_idx, new_quantity, timestamp, &mut self.orders);

        if new_quantity >= old_quantity {
            self.volume = self.volume + (new_quantity - old_quantity);
        } else {
            self.volume = self.volume - (old_quantity - new_quantity);
        }

        let mut dirty = vec![order_idx];
        if will_move {
            // Relocation repatched the old neighbors and the old tail
            if let Some(p) = prev {
                dirty.push(p);
            }
            if let Some(n) = next {
                dirty.push(n);
            }
            if let Some(t) = old_tail {
                if t != order_idx {
                    dirty.push(t);
                }
            }
        }
        self.persist_list(list_idx, &dirty)
    }

    /// Create the price level for `price` in both indices
    fn create_price(&mut self, price: Price) {
        self.depth += 1;
        let key = slots::price_list_key(self.slot, price);
        let slot = slots::price_list_slot(key);
        let list_idx = self.lists.insert(OrderList::new(price, key, slot));
        self.price_tree.insert(price, list_idx);
        self.price_map.insert(price, list_idx);
    }

    /// Drop the price level for `price` from both indices
    fn remove_price(&mut self, price: Price) {
        self.depth -= 1;
        self.price_tree.remove(&price);
        if let Some(list_idx) = self.price_map.remove(&price) {
            self.lists.remove(list_idx);
        }
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Persist the tree record alone
    pub fn save(&self) -> Result<(), BookError> {
        let record = self.to_record()?;
        debug!(key = %self.key, orders = self.num_orders, "persisting order tree");
        self.store
            .put(self.key.as_slice(), codec::encode_order_tree(&record))?;
        Ok(())
    }

    /// Persist the given orders, their list, and the tree in one batch
    fn persist_list(&self, list_idx: usize, dirty: &[usize]) -> Result<(), BookError> {
        let list = &self.lists[list_idx];
        let mut batch = Vec::with_capacity(dirty.len() + 2);
        for &order_idx in dirty {
            let node = &self.orders[order_idx];
            let storage_key = slots::order_storage_key(list.slot(), node.key);
            debug!(order = %node.item.order_id, key = %storage_key, "persisting order");
            batch.push((
                storage_key.as_slice().to_vec(),
                codec::encode_order(&self.order_record(order_idx)),
            ));
        }
        batch.push((
            list.key().as_slice().to_vec(),
            codec::encode_order_list(&self.list_record(list_idx)),
        ));
        batch.push((
            self.key.as_slice().to_vec(),
            codec::encode_order_tree(&self.to_record()?),
        ));
        self.store.write_batch(batch)?;
        Ok(())
    }

    /// Storage-key reference to an order in `list`, empty when absent
    fn link_ref(&self, list: &OrderList, order_idx: Option<usize>) -> Bytes {
        match order_idx {
            Some(idx) => Bytes::from(
                slots::order_storage_key(list.slot(), self.orders[idx].key)
                    .as_slice()
                    .to_vec(),
            ),
            None => Bytes::new(),
        }
    }

    fn order_record(&self, order_idx: usize) -> OrderRecord {
        let node = &self.orders[order_idx];
        let list = &self.lists[node.list];
        codec::order_to_record(
            &node.item,
            node.key,
            self.link_ref(list, node.prev),
            self.link_ref(list, node.next),
            Bytes::from(list.key().as_slice().to_vec()),
        )
    }

    fn list_record(&self, list_idx: usize) -> OrderListRecord {
        let list = &self.lists[list_idx];
        OrderListRecord {
            price: list.price().as_u256(),
            len: list.len() as u64,
            volume: list.volume().as_u256(),
            head: self.link_ref(list, list.head()),
            tail: self.link_ref(list, list.tail()),
            last_order: self.link_ref(list, list.tail()),
            slot: list.slot(),
            key: list.key(),
        }
    }

    /// Flatten the tree into its store shape
    pub fn to_record(&self) -> Result<OrderTreeRecord, BookError> {
        let mut prices = BTreeMap::new();
        for (price, &list_idx) in &self.price_tree {
            prices.insert(price.to_string(), self.lists[list_idx].key().to_string());
        }
        let price_snapshot = codec::encode_snapshot(&prices)?;

        let mut order_keys = BTreeMap::new();
        for (order_id, &order_idx) in &self.order_map {
            let node = &self.orders[order_idx];
            let list = &self.lists[node.list];
            order_keys.insert(
                order_id.to_string(),
                slots::order_storage_key(list.slot(), node.key).to_string(),
            );
        }

        Ok(OrderTreeRecord {
            price_tree: price_snapshot.clone(),
            price_map: price_snapshot,
            order_map: codec::encode_snapshot(&order_keys)?,
            volume: self.volume.as_u256(),
            num_orders: self.num_orders,
            depth: self.depth,
            slot: self.slot,
            key: self.key,
        })
    }

    /// Rebuild a tree from its store shape
    ///
    /// Each price level's orders are fetched by following the stored
    /// head reference and then each order's next reference, so queue
    /// order (and with it time priority) survives the round trip.
    pub fn restore(record: &OrderTreeRecord, store: Arc<dyn Store>) -> Result<Self, BookError> {
        let mut tree = OrderTree::new(record.key, store);

        let price_map = codec::decode_snapshot(&record.price_map)?;
        for (price_str, list_key_str) in &price_map {
            let price = Price::from_str(price_str)
                .map_err(|e| CodecError::Snapshot(e.to_string()))?;
            let list_key = B256::from_str(list_key_str)
                .map_err(|e| CodecError::Snapshot(e.to_string()))?;

            let list_bytes = tree
                .store
                .get(list_key.as_slice())?
                .ok_or_else(|| BookError::NotFound {
                    key: list_key.to_string(),
                })?;
            let list_record = codec::decode_order_list(&list_bytes)?;

            tree.create_price(price);
            let list_idx = tree.price_map[&price];

            let mut next_ref = list_record.head.clone();
            while !next_ref.is_empty() {
                let order_bytes =
                    tree.store
                        .get(&next_ref)?
                        .ok_or_else(|| BookError::NotFound {
                            key: next_ref.to_string(),
                        })?;
                let order_record = codec::decode_order(&order_bytes)?;
                let order = codec::order_from_record(&order_record)?;

                let order_id = order.order_id;
                let quantity = order.quantity;
                let key = slots::order_key(order_id);
                let order_idx = tree.orders.insert(BookOrder {
                    item: order,
                    key,
                    prev: None,
                    next: None,
                    list: list_idx,
                });
                tree.lists[list_idx].append(order_idx, &mut tree.orders);
                tree.order_map.insert(order_id, order_idx);
                tree.num_orders += 1;
                tree.volume = tree.volume + quantity;

                next_ref = order_record.next_order;
            }
        }

        if tree.num_orders != record.num_orders
            || tree.depth != record.depth
            || tree.volume.as_u256() != record.volume
        {
            warn!(key = %tree.key, "restored aggregates diverge from stored record");
        }
        Ok(tree)
    }

    // ── Integrity ───────────────────────────────────────────────────

    /// Check every structural invariant of this side
    ///
    /// Used by tests after each public operation; returns a description
    /// of the first violation found.
    pub fn verify_integrity(&self) -> Result<(), String> {
        if self.price_tree.len() != self.price_map.len() {
            return Err("price_tree and price_map key counts differ".to_string());
        }
        for price in self.price_tree.keys() {
            if !self.price_map.contains_key(price) {
                return Err(format!("price {price} missing from price_map"));
            }
        }
        if self.depth as usize != self.price_map.len() {
            return Err(format!(
                "depth {} != distinct prices {}",
                self.depth,
                self.price_map.len()
            ));
        }

        let mut total_len = 0usize;
        let mut total_volume = Quantity::zero();
        for (&price, &list_idx) in &self.price_map {
            let list = &self.lists[list_idx];
            if list.price() != price {
                return Err(format!("list at {price} carries price {}", list.price()));
            }
            if list.is_empty() {
                return Err(format!("empty list left at price {price}"));
            }

            // Walk head → next exactly len times and expect the tail
            let mut walked = 0usize;
            let mut volume = Quantity::zero();
            let mut cursor = list.head();
            let mut last = None;
            while let Some(idx) = cursor {
                let node = &self.orders[idx];
                if node.item.price != price {
                    return Err(format!(
                        "order {} at price {} linked under level {price}",
                        node.item.order_id, node.item.price
                    ));
                }
                if node.list != list_idx {
                    return Err(format!(
                        "order {} back-reference points at the wrong list",
                        node.item.order_id
                    ));
                }
                walked += 1;
                volume = volume + node.item.quantity;
                last = Some(idx);
                cursor = node.next;
                if walked > list.len() {
                    return Err(format!("list at {price} links more orders than its len"));
                }
            }
            if walked != list.len() {
                return Err(format!(
                    "list at {price} links {walked} orders but len is {}",
                    list.len()
                ));
            }
            if last != list.tail() {
                return Err(format!("walking list at {price} does not end at tail"));
            }
            if volume != list.volume() {
                return Err(format!(
                    "list at {price} volume {} != linked sum {volume}",
                    list.volume()
                ));
            }
            total_len += list.len();
            total_volume = total_volume + list.volume();
        }

        if self.num_orders as usize != total_len {
            return Err(format!(
                "num_orders {} != sum of list lens {total_len}",
                self.num_orders
            ));
        }
        if self.order_map.len() != total_len {
            return Err(format!(
                "order_map holds {} ids but lists link {total_len}",
                self.order_map.len()
            ));
        }
        if self.volume != total_volume {
            return Err(format!(
                "tree volume {} != sum of list volumes {total_volume}",
                self.volume
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use persistence::MemoryStore;
    use types::ids::PairName;
    use types::order::{OrderKind, Side};

    fn tree() -> OrderTree {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let key = slots::segment_hash(slots::book_key("btc/usdt"), slots::BID_SEGMENT);
        OrderTree::new(key, store)
    }

    fn order(id: u64, price: u64, qty: u64) -> Order {
        let mut order = Order::new(
            PairName::new("btc/usdt"),
            Side::Buy,
            OrderKind::Limit,
            Price::from_u64(price),
            Quantity::from_u64(qty),
            Address::repeat_byte(0x11),
            1_700_000_000,
        );
        order.order_id = OrderId::new(id);
        order
    }

    #[test]
    fn test_insert_creates_level() {
        let mut tree = tree();
        tree.insert_order(order(1, 100, 5)).unwrap();

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.num_orders(), 1);
        assert_eq!(tree.volume(), Quantity::from_u64(5));
        assert!(tree.price_exists(Price::from_u64(100)));
        assert!(tree.order_exists(OrderId::new(1)));
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_insert_same_price_shares_level() {
        let mut tree = tree();
        tree.insert_order(order(1, 100, 5)).unwrap();
        tree.insert_order(order(2, 100, 7)).unwrap();

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.num_orders(), 2);
        assert_eq!(tree.volume(), Quantity::from_u64(12));
        assert_eq!(
            tree.price_list(Price::from_u64(100)).unwrap().volume(),
            Quantity::from_u64(12)
        );
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_reinsert_same_id_replaces() {
        let mut tree = tree();
        tree.insert_order(order(1, 100, 5)).unwrap();
        tree.insert_order(order(1, 100, 9)).unwrap();

        assert_eq!(tree.num_orders(), 1);
        assert_eq!(tree.volume(), Quantity::from_u64(9));
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_remove_order_drops_empty_level() {
        let mut tree = tree();
        tree.insert_order(order(1, 100, 5)).unwrap();
        tree.insert_order(order(2, 200, 3)).unwrap();

        let removed = tree.remove_order_by_id(OrderId::new(1)).unwrap().unwrap();
        assert_eq!(removed.quantity, Quantity::from_u64(5));

        assert_eq!(tree.depth(), 1);
        assert!(!tree.price_exists(Price::from_u64(100)));
        assert_eq!(tree.volume(), Quantity::from_u64(3));
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_remove_absent_is_silent() {
        let mut tree = tree();
        assert!(tree.remove_order_by_id(OrderId::new(404)).unwrap().is_none());
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_min_max_prices() {
        let mut tree = tree();
        assert!(tree.max_price().is_zero());
        assert!(tree.min_price().is_zero());
        assert!(tree.max_price_list().is_none());

        tree.insert_order(order(1, 100, 1)).unwrap();
        tree.insert_order(order(2, 300, 1)).unwrap();
        tree.insert_order(order(3, 200, 1)).unwrap();

        assert_eq!(tree.max_price(), Price::from_u64(300));
        assert_eq!(tree.min_price(), Price::from_u64(100));
        assert_eq!(
            tree.max_price_list().unwrap().price(),
            Price::from_u64(300)
        );
        assert_eq!(tree.min_price_list().unwrap().price(), Price::from_u64(100));
    }

    #[test]
    fn test_update_quantity_decrease() {
        let mut tree = tree();
        tree.insert_order(order(1, 100, 10)).unwrap();

        tree.update_order_quantity(OrderId::new(1), Quantity::from_u64(4), 1_700_000_111)
            .unwrap();

        assert_eq!(tree.volume(), Quantity::from_u64(4));
        assert_eq!(
            tree.order(OrderId::new(1)).unwrap().quantity,
            Quantity::from_u64(4)
        );
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_update_quantity_increase_moves_to_tail() {
        let mut tree = tree();
        tree.insert_order(order(1, 100, 10)).unwrap();
        tree.insert_order(order(2, 100, 10)).unwrap();

        let mut update = order(1, 100, 25);
        update.updated_at = 1_700_000_111;
        tree.update_order(update).unwrap();

        let queue: Vec<u64> = tree
            .orders_at(Price::from_u64(100))
            .iter()
            .map(|o| o.order_id.value())
            .collect();
        assert_eq!(queue, vec![2, 1]);
        assert_eq!(tree.volume(), Quantity::from_u64(35));
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_update_price_change_reinserts() {
        let mut tree = tree();
        tree.insert_order(order(1, 100, 10)).unwrap();
        tree.insert_order(order(2, 100, 5)).unwrap();

        let mut update = order(1, 200, 10);
        update.updated_at = 1_700_000_111;
        tree.update_order(update).unwrap();

        assert_eq!(tree.depth(), 2);
        assert!(tree.price_exists(Price::from_u64(200)));
        assert_eq!(tree.orders_at(Price::from_u64(100)).len(), 1);
        assert_eq!(tree.orders_at(Price::from_u64(200)).len(), 1);
        assert_eq!(tree.volume(), Quantity::from_u64(15));
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_update_price_change_drops_emptied_level() {
        let mut tree = tree();
        tree.insert_order(order(1, 100, 10)).unwrap();

        let update = order(1, 200, 10);
        tree.update_order(update).unwrap();

        // The old (emptied) level goes away, not the new one
        assert!(!tree.price_exists(Price::from_u64(100)));
        assert!(tree.price_exists(Price::from_u64(200)));
        assert_eq!(tree.depth(), 1);
        tree.verify_integrity().unwrap();
    }

    #[test]
    fn test_tree_persists_and_restores() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let key = slots::segment_hash(slots::book_key("btc/usdt"), slots::BID_SEGMENT);
        let mut tree = OrderTree::new(key, Arc::clone(&store));

        tree.insert_order(order(1, 100, 5)).unwrap();
        tree.insert_order(order(2, 100, 7)).unwrap();
        tree.insert_order(order(3, 200, 2)).unwrap();
        tree.save().unwrap();

        let record = tree.to_record().unwrap();
        let restored = OrderTree::restore(&record, store).unwrap();

        assert_eq!(restored.num_orders(), 3);
        assert_eq!(restored.depth(), 2);
        assert_eq!(restored.volume(), Quantity::from_u64(14));
        let queue: Vec<u64> = restored
            .orders_at(Price::from_u64(100))
            .iter()
            .map(|o| o.order_id.value())
            .collect();
        assert_eq!(queue, vec![1, 2]);
        restored.verify_integrity().unwrap();
    }
}
