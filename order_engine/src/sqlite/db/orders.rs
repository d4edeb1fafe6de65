use std::collections::HashMap;

use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Money, NewOrder, NewOrderItem, Order, OrderId, OrderItem, OrderStatusType, StatusChange},
    order_objects::OrderQueryFilter,
    traits::OrderStoreError,
};

/// Inserts a new order and its items using the given connection. This is not atomic on its own. Run it inside a
/// transaction and pass `&mut tx` as the connection argument so that a failure on any item discards the whole order.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let NewOrder { user_id, total_amount, items } = order;
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (user_id, total_amount, status)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(total_amount)
    .bind(OrderStatusType::Pending.as_str())
    .fetch_one(&mut *conn)
    .await?;
    trace!("🗃️ Order {} inserted. Adding {} items", order.id, items.len());
    let mut saved_items = Vec::with_capacity(items.len());
    for item in items {
        let saved = insert_item(&order.id, item, conn).await?;
        saved_items.push(saved);
    }
    debug!("🗃️ Order {} saved with {} items for a total of {}", order.id, saved_items.len(), order.total_amount);
    Ok(order.with_items(saved_items))
}

async fn insert_item(
    order_id: &OrderId,
    item: NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, OrderStoreError> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(item.product_id.as_str())
    .bind(item.quantity)
    .bind(item.unit_price)
    .fetch_one(&mut *conn)
    .await?;
    Ok(item)
}

/// Returns the order with the given id, with its items
pub async fn fetch_order_by_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderStoreError> {
    let order: Option<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id.as_str()).fetch_optional(&mut *conn).await?;
    match order {
        Some(order) => {
            let items = fetch_items_for_order(&order.id, conn).await?;
            Ok(Some(order.with_items(items)))
        },
        None => Ok(None),
    }
}

pub async fn fetch_items_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, OrderStoreError> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order, with insertion order breaking ties.
pub async fn search_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderStoreError> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status COLLATE NOCASE IN (");
        let mut first = true;
        for status in statuses {
            if !first {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.as_str());
            first = false;
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("datetime(created_at) >= datetime(");
        where_clause.push_bind_unseparated(since);
        where_clause.push_unseparated(")");
    }
    if let Some(until) = query.until {
        where_clause.push("datetime(created_at) <= datetime(");
        where_clause.push_bind_unseparated(until);
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at ASC, rowid ASC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(&mut *conn).await?;
    trace!("🗃️ Result of search_orders: {} orders", orders.len());
    attach_items(orders, conn).await
}

/// Loads the items for all the given orders in a single query.
async fn attach_items(orders: Vec<Order>, conn: &mut SqliteConnection) -> Result<Vec<Order>, OrderStoreError> {
    if orders.is_empty() {
        return Ok(orders);
    }
    let mut builder = QueryBuilder::new("SELECT * FROM order_items WHERE order_id IN (");
    let mut ids = builder.separated(", ");
    for order in &orders {
        ids.push_bind(order.id.0.clone());
    }
    builder.push(") ORDER BY id ASC");
    let items = builder.build_query_as::<OrderItem>().fetch_all(conn).await?;
    let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id.clone()).or_default().push(item);
    }
    let orders = orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            order.with_items(items)
        })
        .collect();
    Ok(orders)
}

/// Moves the order to `change.to`, provided it is still in the `change.from` state. If the change carries a
/// commission, it is written by the same statement.
///
/// Returns `None` if no row matched, either because the order does not exist or because its status has moved on.
/// The returned order does not have its items attached.
pub(crate) async fn update_order_status(
    order_id: &OrderId,
    change: &StatusChange,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderStoreError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                commission = COALESCE($2, commission),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND status = $4 COLLATE NOCASE
            RETURNING *;
        "#,
    )
    .bind(change.to.as_str())
    .bind(change.commission)
    .bind(order_id.as_str())
    .bind(change.from.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(result)
}

/// Sets the commission for an order, but only if the order has been delivered.
///
/// Returns `None` if no row matched. The returned order does not have its items attached.
pub(crate) async fn update_commission(
    order_id: &OrderId,
    commission: Money,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderStoreError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET commission = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = $3 COLLATE NOCASE
            RETURNING *;
        "#,
    )
    .bind(commission)
    .bind(order_id.as_str())
    .bind(OrderStatusType::Delivered.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(result)
}
