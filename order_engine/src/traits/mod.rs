//! # Order store and pricing contracts
//!
//! This module defines the interfaces that order engine *backends* and collaborators must provide.
//!
//! * [`OrderManagement`] is the durable record of orders, their line items and their status history. Backends must
//!   write an order and its items atomically, and apply status changes as a compare-and-set on the previous status.
//! * [`PriceSource`] resolves the unit price of a product at the moment an order is placed.
mod order_management;
mod price_source;

pub use order_management::{OrderManagement, OrderStoreError};
pub use price_source::{PriceSource, PricingError};
