use sqlx::SqliteConnection;

use crate::{
    db_types::{OrderId, OrderStatusChange, StatusChange},
    traits::OrderStoreError,
};

pub(crate) async fn insert_status_change(
    order_id: &OrderId,
    change: &StatusChange,
    conn: &mut SqliteConnection,
) -> Result<OrderStatusChange, OrderStoreError> {
    let entry = sqlx::query_as(
        r#"
            INSERT INTO order_status_history (order_id, old_status, new_status, actor_id, actor_role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(change.from.as_str())
    .bind(change.to.as_str())
    .bind(change.actor_id.as_str())
    .bind(change.actor_role.as_str())
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

pub async fn fetch_status_history(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderStatusChange>, OrderStoreError> {
    let history = sqlx::query_as("SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(history)
}
