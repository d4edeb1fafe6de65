//! `SqliteDatabase` is a concrete implementation of an order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the [`OrderManagement`] trait.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, orders, status_history};
use crate::{
    db_types::{Money, NewOrder, Order, OrderId, OrderStatusChange, StatusChange},
    order_objects::OrderQueryFilter,
    traits::{OrderManagement, OrderStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_id(order_id, &mut conn).await
    }

    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let query = OrderQueryFilter::default().with_user_id(user_id);
        orders::search_orders(query, &mut conn).await
    }

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(OrderQueryFilter::default(), &mut conn).await
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(query, &mut conn).await
    }

    /// The conditional `UPDATE` is the first statement of the transaction, so the write lock is taken before anything
    /// is read. A competing transition either waits for this one to commit and then matches no rows, or wins.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        change: StatusChange,
    ) -> Result<Option<Order>, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let updated = orders::update_order_status(order_id, &change, &mut tx).await?;
        let result = match updated {
            Some(order) => {
                let entry = status_history::insert_status_change(order_id, &change, &mut tx).await?;
                trace!(
                    "🗃️ Status history #{} recorded for order {order_id}: {} -> {}",
                    entry.id,
                    entry.old_status,
                    entry.new_status
                );
                let items = orders::fetch_items_for_order(order_id, &mut tx).await?;
                tx.commit().await?;
                debug!("🗃️ Order {order_id} moved from {} to {} by {}", change.from, change.to, change.actor_id);
                Some(order.with_items(items))
            },
            None => {
                let current = orders::fetch_order_by_id(order_id, &mut tx).await?;
                tx.rollback().await?;
                match current {
                    Some(order) => {
                        debug!(
                            "🗃️ Order {order_id} was expected to be {} but is {}. Status not changed",
                            change.from, order.status
                        );
                        None
                    },
                    None => return Err(OrderStoreError::OrderNotFound(order_id.clone())),
                }
            },
        };
        Ok(result)
    }

    async fn update_commission(&self, order_id: &OrderId, commission: Money) -> Result<Option<Order>, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let updated = orders::update_commission(order_id, commission, &mut tx).await?;
        let result = match updated {
            Some(order) => {
                let items = orders::fetch_items_for_order(order_id, &mut tx).await?;
                tx.commit().await?;
                debug!("🗃️ Commission for order {order_id} set to {commission}");
                Some(order.with_items(items))
            },
            None => {
                let exists = orders::fetch_order_by_id(order_id, &mut tx).await?.is_some();
                tx.rollback().await?;
                if !exists {
                    return Err(OrderStoreError::OrderNotFound(order_id.clone()));
                }
                None
            },
        };
        Ok(result)
    }

    async fn fetch_status_history(&self, order_id: &OrderId) -> Result<Vec<OrderStatusChange>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        status_history::fetch_status_history(order_id, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), OrderStoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `ORDERS_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
