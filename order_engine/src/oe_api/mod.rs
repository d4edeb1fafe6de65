//! # Order engine public API
//!
//! * [`order_flow_api`] places orders and moves them through their lifecycle.
//! * [`transition_policy`] decides which status changes each role may make.
//! * [`pricing`] holds the simple price sources used when no product catalogue is attached.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements [`crate::traits::OrderManagement`]
//! and a [`crate::traits::PriceSource`]:
//!
//! ```rust,ignore
//! use order_engine::{FixedPrice, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/orders.db", 25).await?;
//! let api = OrderFlowApi::new(db, FixedPrice::default());
//! let order = api.create_order("alice", OrderCreateRequest::default().with_item("p1", 2)).await?;
//! ```
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod pricing;
pub mod transition_policy;
