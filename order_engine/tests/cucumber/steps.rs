use cucumber::{given, then, when};
use order_engine::{
    db_types::{Money, OrderStatusType, Role},
    order_objects::{OrderCreateRequest, OrderLine},
    traits::OrderManagement,
    OrderFlowError,
};

use crate::cucumber::{order_world::OrderSystem, OrderWorld};

fn parse_items(items: &str) -> OrderCreateRequest {
    let lines = items
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|line| {
            let (product, quantity) = line.split_once(':').expect("Items are written as product:quantity");
            OrderLine::new(product.trim(), quantity.trim().parse::<i64>().expect("Invalid quantity"))
        })
        .collect();
    OrderCreateRequest::new(lines)
}

fn money(value: f64) -> Money {
    Money::try_from_major(value).expect("Invalid amount")
}

#[given(expr = "an order system with a commission rate of {int} basis points")]
async fn order_system(world: &mut OrderWorld, bps: u32) {
    world.system = Some(OrderSystem::new(bps).await);
}

#[given(expr = "an order system")]
async fn default_order_system(world: &mut OrderWorld) {
    world.system = Some(OrderSystem::new(order_engine::DEFAULT_COMMISSION_RATE_BPS).await);
}

#[when(expr = "{word} places order {word} with items {string}")]
async fn place_order(world: &mut OrderWorld, user_id: String, label: String, items: String) {
    let result = world.api().create_order(&user_id, parse_items(&items)).await;
    if let Ok(order) = &result {
        world.orders.insert(label, order.id.clone());
    }
    world.last_result = Some(result);
}

#[given(expr = "{word} has placed order {word} with items {string}")]
async fn placed_order(world: &mut OrderWorld, user_id: String, label: String, items: String) {
    place_order(world, user_id, label.clone(), items).await;
    assert!(world.orders.contains_key(&label), "Order {label} could not be placed: {:?}", world.last_result);
}

#[when(expr = "{word} acting as {word} moves order {word} to {word}")]
async fn move_order(world: &mut OrderWorld, user_id: String, role: String, label: String, status: String) {
    let role = role.parse::<Role>().expect("Invalid role");
    let next = status.parse::<OrderStatusType>().expect("Invalid status");
    let order_id = world.order_id(&label);
    let result = world.api().update_order_status(&order_id, next, &user_id, role).await;
    world.last_result = Some(result);
}

#[given(expr = "{word} acting as {word} has moved order {word} to {word}")]
async fn moved_order(world: &mut OrderWorld, user_id: String, role: String, label: String, status: String) {
    move_order(world, user_id, role, label.clone(), status.clone()).await;
    assert!(
        matches!(world.last_result, Some(Ok(_))),
        "Could not move order {label} to {status}: {:?}",
        world.last_result
    );
}

#[when(expr = "{word} views order {word}")]
async fn view_order(world: &mut OrderWorld, user_id: String, label: String) {
    let order_id = world.order_id(&label);
    let result = world.api().fetch_order(&order_id, &user_id, false).await;
    world.last_result = Some(result);
}

#[when(expr = "an admin views order {word}")]
async fn admin_views_order(world: &mut OrderWorld, label: String) {
    let order_id = world.order_id(&label);
    let result = world.api().fetch_order(&order_id, "admin", true).await;
    world.last_result = Some(result);
}

#[when(expr = "the commission is calculated for order {word}")]
async fn calculate_commission(world: &mut OrderWorld, label: String) {
    let order_id = world.order_id(&label);
    let result = world.api().calculate_and_set_commission(&order_id).await;
    world.last_result = Some(result);
}

#[then(expr = "the request succeeds")]
async fn request_succeeds(world: &mut OrderWorld) {
    assert!(matches!(world.last_result, Some(Ok(_))), "Request failed: {:?}", world.last_result);
}

#[then(expr = "the request fails with {word}")]
async fn request_fails(world: &mut OrderWorld, kind: String) {
    let err = world.last_error();
    let matched = match kind.as_str() {
        "ValidationError" => matches!(err, OrderFlowError::ValidationError(_)),
        "NotFoundError" => matches!(err, OrderFlowError::NotFoundError(_)),
        "ForbiddenError" => matches!(err, OrderFlowError::ForbiddenError(_)),
        "InvalidTransition" => matches!(err, OrderFlowError::InvalidTransition { .. }),
        "InvalidState" => matches!(err, OrderFlowError::InvalidState { .. }),
        other => panic!("Unknown error kind: {other}"),
    };
    assert!(matched, "Expected {kind}, but got {err:?}");
}

#[then(expr = "order {word} has status {word}")]
async fn order_has_status(world: &mut OrderWorld, label: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Invalid status");
    let order_id = world.order_id(&label);
    let order = world.api().db().fetch_order_by_id(&order_id).await.expect("Error fetching order");
    let order = order.unwrap_or_else(|| panic!("Order {label} does not exist"));
    assert_eq!(order.status, expected, "Status is incorrect");
}

#[then(expr = "order {word} has a total of {float}")]
async fn order_has_total(world: &mut OrderWorld, label: String, total: f64) {
    let order_id = world.order_id(&label);
    let order = world.api().db().fetch_order_by_id(&order_id).await.expect("Error fetching order");
    let order = order.unwrap_or_else(|| panic!("Order {label} does not exist"));
    assert_eq!(order.total_amount, money(total), "Total is incorrect");
}

#[then(expr = "order {word} has a commission of {float}")]
async fn order_has_commission(world: &mut OrderWorld, label: String, commission: f64) {
    let order_id = world.order_id(&label);
    let order = world.api().db().fetch_order_by_id(&order_id).await.expect("Error fetching order");
    let order = order.unwrap_or_else(|| panic!("Order {label} does not exist"));
    assert_eq!(order.commission, Some(money(commission)), "Commission is incorrect");
}

#[then(expr = "order {word} has no commission")]
async fn order_has_no_commission(world: &mut OrderWorld, label: String) {
    let order_id = world.order_id(&label);
    let order = world.api().db().fetch_order_by_id(&order_id).await.expect("Error fetching order");
    let order = order.unwrap_or_else(|| panic!("Order {label} does not exist"));
    assert!(order.commission.is_none(), "Commission is {:?}", order.commission);
}

#[then(expr = "{word} has {int} order(s)")]
async fn user_has_orders(world: &mut OrderWorld, user_id: String, count: usize) {
    let orders = world.api().orders_for_user(&user_id).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count, "Order count is incorrect");
}

#[then(expr = "the history of order {word} has {int} entries")]
async fn history_length(world: &mut OrderWorld, label: String, count: usize) {
    let order_id = world.order_id(&label);
    let history = world.api().db().fetch_status_history(&order_id).await.expect("Error fetching history");
    assert_eq!(history.len(), count, "History length is incorrect");
}
