//! Order book infrastructure module
//!
//! Contains the per-price FIFO list and the price-indexed tree for one
//! book side. Orders live in a slab arena; list membership and neighbor
//! links are arena keys, never owning handles.

pub mod order_list;
pub mod order_tree;

pub use order_list::{BookOrder, OrderList};
pub use order_tree::OrderTree;
