//! Order Lifecycle Engine
//!
//! This library contains the core logic of the order service: placing orders, moving them through their status
//! lifecycle, and computing the commission owed once an order is delivered.
//!
//! The library is divided into three main sections:
//! 1. The order store contracts ([`mod@traits`]) and the SQLite backend ([`SqliteDatabase`]). The data types used by
//!    the store are defined in the [`mod@db_types`] module and are public.
//! 2. The transition policy ([`mod@transition_policy`]), a pure description of which role may move an order between
//!    which statuses.
//! 3. The public API ([`OrderFlowApi`]), which validates and prices new orders, enforces ownership rules, and applies
//!    status changes through the policy.
pub mod db_types;
mod oe_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use oe_api::{
    errors::OrderFlowError,
    order_flow_api::{OrderFlowApi, DEFAULT_COMMISSION_RATE_BPS},
    order_objects,
    pricing::{FixedPrice, PriceList, DEFAULT_UNIT_PRICE},
    transition_policy,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db::db_url, SqliteDatabase};
