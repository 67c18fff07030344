//! Pair-level order book and matching algorithm
//!
//! One book owns a bid tree and an ask tree and matches incoming orders
//! against the opposing side level by level, best price first, head of
//! queue first. The caller serializes operations against one book; each
//! operation completes synchronously and persists what it touched before
//! returning.

use alloy_primitives::{B256, U256};
use persistence::Store;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};
use types::errors::BookError;
use types::ids::{OrderId, PairName};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, Side};
use types::trade::Trade;

use crate::book::OrderTree;
use crate::codec::{self, OrderBookRecord};
use crate::slots;

/// Order book for a single trading pair
pub struct OrderBook {
    pair_name: PairName,
    bids: OrderTree,
    asks: OrderTree,
    /// Book clock, seconds since epoch, advanced on every operation
    time: u64,
    /// Monotonic id counter; ids are assigned at insertion
    next_order_id: u64,
    key: B256,
    slot: U256,
    store: Arc<dyn Store>,
}

impl OrderBook {
    /// Create an empty book for `pair_name`
    ///
    /// The book key is the keccak hash of the canonical pair name; the
    /// side keys segment it so bids, asks, and everything under them
    /// occupy disjoint storage namespaces.
    pub fn new(pair_name: PairName, store: Arc<dyn Store>) -> Self {
        let key = slots::book_key(pair_name.as_str());
        let slot = slots::slot_from_key(key);
        let bids_key = slots::segment_hash(key, slots::BID_SEGMENT);
        let asks_key = slots::segment_hash(key, slots::ASK_SEGMENT);

        Self {
            bids: OrderTree::new(bids_key, Arc::clone(&store)),
            asks: OrderTree::new(asks_key, Arc::clone(&store)),
            time: 0,
            next_order_id: 0,
            pair_name,
            key,
            slot,
            store,
        }
    }

    /// Canonical pair name
    pub fn pair_name(&self) -> &PairName {
        &self.pair_name
    }

    /// Bid side
    pub fn bids(&self) -> &OrderTree {
        &self.bids
    }

    /// Ask side
    pub fn asks(&self) -> &OrderTree {
        &self.asks
    }

    /// Book clock (seconds since epoch of the last operation)
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Value of the monotonic id counter
    pub fn next_order_id(&self) -> u64 {
        self.next_order_id
    }

    /// Storage key of the book
    pub fn key(&self) -> B256 {
        self.key
    }

    /// Highest bid, zero when the bid side is empty
    pub fn best_bid(&self) -> Price {
        self.bids.max_price()
    }

    /// Lowest ask, zero when the ask side is empty
    pub fn best_ask(&self) -> Price {
        self.asks.min_price()
    }

    /// Lowest bid, zero when the bid side is empty
    pub fn worst_bid(&self) -> Price {
        self.bids.min_price()
    }

    /// Highest ask, zero when the ask side is empty
    pub fn worst_ask(&self) -> Price {
        self.asks.max_price()
    }

    /// Resting volume at one price on one side
    pub fn volume_at_price(&self, side: Side, price: Price) -> Quantity {
        let tree = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        tree.price_list(price)
            .map(|list| list.volume())
            .unwrap_or_else(Quantity::zero)
    }

    fn update_time(&mut self) {
        self.time = now_seconds();
    }

    // ── Matching ────────────────────────────────────────────────────

    /// Process an incoming order
    ///
    /// Returns the trades in consumption order and, for a limit order
    /// with unmatched quantity, the order as it now rests in the book.
    /// Unfilled market quantity is discarded, never rested.
    pub fn process_order(
        &mut self,
        mut order: Order,
        verbose: bool,
    ) -> Result<(Vec<Trade>, Option<Order>), BookError> {
        self.update_time();
        order.updated_at = self.time;
        self.next_order_id += 1;

        let result = match order.kind {
            OrderKind::Market => (self.process_market_order(&order, verbose)?, None),
            OrderKind::Limit => self.process_limit_order(order, verbose)?,
        };
        self.persist_book()?;
        Ok(result)
    }

    fn process_market_order(
        &mut self,
        order: &Order,
        verbose: bool,
    ) -> Result<Vec<Trade>, BookError> {
        let mut trades = Vec::new();
        let mut remaining = order.quantity;

        match order.side {
            Side::Buy => {
                while !remaining.is_zero() && !self.asks.is_empty() {
                    let Some(list_idx) = self.asks.min_price_list_idx() else {
                        break;
                    };
                    let (left, new_trades) = Self::process_order_list(
                        &mut self.asks,
                        self.time,
                        list_idx,
                        remaining,
                        verbose,
                    )?;
                    remaining = left;
                    trades.extend(new_trades);
                }
            }
            Side::Sell => {
                while !remaining.is_zero() && !self.bids.is_empty() {
                    let Some(list_idx) = self.bids.max_price_list_idx() else {
                        break;
                    };
                    let (left, new_trades) = Self::process_order_list(
                        &mut self.bids,
                        self.time,
                        list_idx,
                        remaining,
                        verbose,
                    )?;
                    remaining = left;
                    trades.extend(new_trades);
                }
            }
        }
        Ok(trades)
    }

    fn process_limit_order(
        &mut self,
        mut order: Order,
        verbose: bool,
    ) -> Result<(Vec<Trade>, Option<Order>), BookError> {
        let mut trades = Vec::new();
        let mut remaining = order.quantity;
        let price = order.price;

        match order.side {
            Side::Buy => {
                while !remaining.is_zero()
                    && !self.asks.is_empty()
                    && price >= self.asks.min_price()
                {
                    let Some(list_idx) = self.asks.min_price_list_idx() else {
                        break;
                    };
                    let (left, new_trades) = Self::process_order_list(
                        &mut self.asks,
                        self.time,
                        list_idx,
                        remaining,
                        verbose,
                    )?;
                    remaining = left;
                    trades.extend(new_trades);
                }
            }
            Side::Sell => {
                while !remaining.is_zero()
                    && !self.bids.is_empty()
                    && price <= self.bids.max_price()
                {
                    let Some(list_idx) = self.bids.max_price_list_idx() else {
                        break;
                    };
                    let (left, new_trades) = Self::process_order_list(
                        &mut self.bids,
                        self.time,
                        list_idx,
                        remaining,
                        verbose,
                    )?;
                    remaining = left;
                    trades.extend(new_trades);
                }
            }
        }

        if !remaining.is_zero() {
            order.order_id = OrderId::new(self.next_order_id);
            order.quantity = remaining;
            match order.side {
                Side::Buy => self.bids.insert_order(order.clone())?,
                Side::Sell => self.asks.insert_order(order.clone())?,
            }
            return Ok((trades, Some(order)));
        }
        Ok((trades, None))
    }

    /// Consume one opposing price list head-first
    ///
    /// A head larger than the remainder is partially filled in place: its
    /// quantity shrinks but its queue position and `updated_at` stay, so
    /// a partial fill never costs time priority. Heads consumed whole are
    /// removed through the tree, which also drops the level when it
    /// empties.
    fn process_order_list(
        tree: &mut OrderTree,
        book_time: u64,
        list_idx: usize,
        quantity_still_to_trade: Quantity,
        verbose: bool,
    ) -> Result<(Quantity, Vec<Trade>), BookError> {
        let mut trades = Vec::new();
        let mut remaining = quantity_still_to_trade;

        while tree.list_len_at(list_idx) > 0 && !remaining.is_zero() {
            let Some(head_idx) = tree.head_at(list_idx) else {
                break;
            };
            let head = tree.order_at(head_idx);
            let head_id = head.order_id;
            let head_quantity = head.quantity;
            let head_updated_at = head.updated_at;
            let traded_price = head.price;

            let traded_quantity;
            if remaining < head_quantity {
                traded_quantity = remaining;
                tree.update_order_quantity(
                    head_id,
                    head_quantity - remaining,
                    head_updated_at,
                )?;
                remaining = Quantity::zero();
            } else if remaining == head_quantity {
                traded_quantity = remaining;
                tree.remove_order_by_id(head_id)?;
                remaining = Quantity::zero();
            } else {
                traded_quantity = head_quantity;
                tree.remove_order_by_id(head_id)?;
            }

            if verbose {
                trace!(
                    time = book_time,
                    price = %traded_price,
                    quantity = %traded_quantity,
                    maker = %head_id,
                    "trade executed"
                );
            }
            trades.push(Trade::new(book_time, traded_price, traded_quantity));
        }
        Ok((remaining, trades))
    }

    // ── Cancel / modify / pending ───────────────────────────────────

    /// Cancel a resting order; silent when the id is not resting
    pub fn cancel_order(&mut self, order: &Order) -> Result<(), BookError> {
        self.update_time();

        let tree = match order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if tree.order_exists(order.order_id) {
            tree.remove_order_by_id(order.order_id)?;
        }
        self.persist_book()
    }

    /// Apply an update to the resting order with `order_id`
    ///
    /// Silent when the id is not resting. Price changes and quantity
    /// increases forfeit time priority.
    pub fn modify_order(&mut self, mut update: Order, order_id: OrderId) -> Result<(), BookError> {
        self.update_time();
        update.order_id = order_id;
        update.updated_at = self.time;

        let tree = match update.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if tree.order_exists(order_id) {
            tree.update_order(update)?;
        }
        self.persist_book()
    }

    /// Modify keyed by the id the update itself carries
    pub fn update_order(&mut self, update: Order) -> Result<(), BookError> {
        let order_id = update.order_id;
        self.modify_order(update, order_id)
    }

    /// Admit an order to its side without running the match loop
    ///
    /// Used for bootstrap and replay. Zero-quantity input is skipped,
    /// though the clock and id counter still advance.
    pub fn save_order_pending(&mut self, mut order: Order) -> Result<(), BookError> {
        self.update_time();
        self.next_order_id += 1;

        if !order.quantity.is_zero() {
            order.order_id = OrderId::new(self.next_order_id);
            match order.side {
                Side::Buy => self.bids.insert_order(order)?,
                Side::Sell => self.asks.insert_order(order)?,
            }
        }
        self.save()
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Persist both sides and the book record
    pub fn save(&self) -> Result<(), BookError> {
        self.asks.save()?;
        self.bids.save()?;
        self.persist_book()
    }

    fn persist_book(&self) -> Result<(), BookError> {
        let record = self.to_record()?;
        debug!(pair = %self.pair_name, key = %self.key, "persisting order book");
        self.store
            .put(self.key.as_slice(), codec::encode_order_book(&record))?;
        Ok(())
    }

    /// Flatten the book into its store shape
    pub fn to_record(&self) -> Result<OrderBookRecord, BookError> {
        Ok(OrderBookRecord {
            pair_name: self.pair_name.as_str().to_string(),
            time: self.time,
            next_order_id: self.next_order_id,
            key: self.key,
            slot: self.slot,
            bids: self.bids.to_record()?,
            asks: self.asks.to_record()?,
        })
    }

    /// Rebuild a book previously saved under `pair_name`
    ///
    /// Missing books are an error (unlike cancel/modify of a missing
    /// order, which is silent).
    pub fn restore(pair_name: PairName, store: Arc<dyn Store>) -> Result<Self, BookError> {
        let key = slots::book_key(pair_name.as_str());
        let bytes = store
            .get(key.as_slice())?
            .ok_or_else(|| BookError::NotFound {
                key: key.to_string(),
            })?;
        let record = codec::decode_order_book(&bytes)?;

        let bids = OrderTree::restore(&record.bids, Arc::clone(&store))?;
        let asks = OrderTree::restore(&record.asks, Arc::clone(&store))?;

        Ok(Self {
            pair_name: PairName::new(record.pair_name),
            bids,
            asks,
            time: record.time,
            next_order_id: record.next_order_id,
            key,
            slot: slots::slot_from_key(key),
            store,
        })
    }
}

fn now_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
