use thiserror::Error;

use crate::{
    db_types::{Money, NewOrder, Order, OrderId, OrderStatusChange, StatusChange},
    order_objects::OrderQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines the behaviour of the durable order store.
///
/// Orders returned from any of these methods always carry their line items.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores the order and all of its items in a single atomic transaction. If any part of the write fails, nothing
    /// is persisted. The new order is `Pending`, and its id and timestamps are assigned by the store.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// All orders placed by the given user, oldest first.
    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderStoreError>;

    /// Every order in the store, oldest first.
    async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderStoreError>;

    /// Fetches orders matching the criteria in the filter, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;

    /// Applies a status change as a compare-and-set on `change.from`.
    ///
    /// In one transaction, the status (and the commission, if the change carries one) is updated only if the order is
    /// still in the `from` state, and an entry is appended to the status history.
    ///
    /// Returns `Ok(Some(order))` with the updated order if the change was applied, and `Ok(None)` if the order exists
    /// but was no longer in the `from` state. Returns `OrderNotFound` if there is no such order.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        change: StatusChange,
    ) -> Result<Option<Order>, OrderStoreError>;

    /// Sets the commission on a delivered order. Returns `Ok(None)` if the order exists but is not `Delivered`.
    async fn update_commission(&self, order_id: &OrderId, commission: Money) -> Result<Option<Order>, OrderStoreError>;

    /// The status transitions recorded for the order, oldest first.
    async fn fetch_status_history(&self, order_id: &OrderId) -> Result<Vec<OrderStatusChange>, OrderStoreError>;

    /// Closes the underlying connection pool.
    async fn close(&mut self) -> Result<(), OrderStoreError>;
}
