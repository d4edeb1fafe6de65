use actix_web::{http::StatusCode, test::TestRequest};
use order_engine::{
    db_types::{Money, OrderId, OrderStatusType, Role},
    traits::OrderStoreError,
};
use serde_json::{json, Value};

use super::{
    helpers::{order, send, stored, token_for, with_token},
    mocks::MockOrderStore,
};

fn parse(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Body is not JSON ({e}): {body}"))
}

#[actix_web::test]
async fn health_needs_no_token() {
    let (status, body) = send(TestRequest::get().uri("/health"), MockOrderStore::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn create_order() {
    let mut store = MockOrderStore::new();
    store
        .expect_insert_order()
        .withf(|o| o.user_id == "alice" && o.total_amount == Money::from_minor(3000) && o.items.len() == 2)
        .times(1)
        .returning(|o| Ok(stored(o)));
    let req = TestRequest::post().uri("/api/orders").set_json(json!({
        "items": [{ "product_id": "p1", "quantity": 2 }, { "product_id": "p2", "quantity": 1 }]
    }));
    let (status, body) = send(with_token(req, &token_for("alice", Role::Buyer)), store).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order = parse(&body);
    assert_eq!(order["id"], "order-1");
    assert_eq!(order["user_id"], "alice");
    assert_eq!(order["total_amount"], 30.0);
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["commission"], Value::Null);
    assert_eq!(order["items"].as_array().map(|a| a.len()), Some(2));
    assert!(order["created_at"].is_string());
    assert!(order["updated_at"].is_string());
}

#[actix_web::test]
async fn create_order_without_items() {
    let mut store = MockOrderStore::new();
    store.expect_insert_order().never();
    let req = TestRequest::post().uri("/api/orders").set_json(json!({ "items": [] }));
    let (status, body) = send(with_token(req, &token_for("alice", Role::Buyer)), store).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(parse(&body)["error"].as_str().unwrap().contains("Invalid request"), "{body}");
}

#[actix_web::test]
async fn create_order_with_zero_quantity() {
    let mut store = MockOrderStore::new();
    store.expect_insert_order().never();
    let req =
        TestRequest::post().uri("/api/orders").set_json(json!({ "items": [{ "product_id": "p1", "quantity": 0 }] }));
    let (status, _) = send(with_token(req, &token_for("alice", Role::Buyer)), store).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_body_gets_a_json_error() {
    let req = TestRequest::post().uri("/api/orders").set_json(json!({ "items": "lots" }));
    let (status, body) = send(with_token(req, &token_for("alice", Role::Buyer)), MockOrderStore::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(parse(&body)["error"].is_string(), "{body}");
}

#[actix_web::test]
async fn wrong_role_never_reaches_the_store() {
    let routes = [
        (TestRequest::put().uri("/api/orders/order-1/process"), Role::Buyer),
        (TestRequest::put().uri("/api/orders/order-1/cancel"), Role::Partner),
        (TestRequest::put().uri("/api/orders/order-1/ship"), Role::Buyer),
        (TestRequest::put().uri("/api/orders/order-1/commission"), Role::Partner),
        (TestRequest::put().uri("/api/orders/order-1/confirm-ready"), Role::Admin),
        (TestRequest::put().uri("/api/orders/order-1/confirm-delivery"), Role::Partner),
        (TestRequest::get().uri("/api/orders"), Role::Buyer),
        (TestRequest::get().uri("/api/orders/search"), Role::Partner),
    ];
    for (req, role) in routes {
        let mut store = MockOrderStore::new();
        store.expect_fetch_order_by_id().never();
        store.expect_fetch_all_orders().never();
        store.expect_search_orders().never();
        store.expect_update_order_status().never();
        store.expect_update_commission().never();
        let (status, body) = send(with_token(req, &token_for("eve", role)), store).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}: {body}");
        assert!(parse(&body)["error"].as_str().unwrap().contains("may not perform this action"), "{body}");
    }
}

#[actix_web::test]
async fn admin_lists_all_orders() {
    let mut store = MockOrderStore::new();
    store.expect_fetch_all_orders().times(1).returning(|| {
        Ok(vec![order("a", "alice", OrderStatusType::Pending), order("b", "bob", OrderStatusType::Shipped)])
    });
    let req = TestRequest::get().uri("/api/orders");
    let (status, body) = send(with_token(req, &token_for("ann", Role::Admin)), store).await;
    assert_eq!(status, StatusCode::OK);
    let orders = parse(&body);
    assert_eq!(orders.as_array().map(|a| a.len()), Some(2));
    assert_eq!(orders[1]["status"], "Shipped");
}

#[actix_web::test]
async fn my_orders_is_not_mistaken_for_an_order_id() {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_id().never();
    store
        .expect_fetch_orders_for_user()
        .withf(|user_id| user_id == "alice")
        .times(1)
        .returning(|_| Ok(vec![order("a", "alice", OrderStatusType::Pending)]));
    let req = TestRequest::get().uri("/api/orders/mine");
    let (status, body) = send(with_token(req, &token_for("alice", Role::Buyer)), store).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(parse(&body)[0]["id"], "a");
}

#[actix_web::test]
async fn owner_and_admin_can_fetch_an_order() {
    for (user, role) in [("alice", Role::Buyer), ("ann", Role::Admin)] {
        let mut store = MockOrderStore::new();
        store
            .expect_fetch_order_by_id()
            .withf(|id| id.as_str() == "order-1")
            .returning(|_| Ok(Some(order("order-1", "alice", OrderStatusType::Processing))));
        let req = TestRequest::get().uri("/api/orders/order-1");
        let (status, body) = send(with_token(req, &token_for(user, role)), store).await;
        assert_eq!(status, StatusCode::OK, "{user}: {body}");
        assert_eq!(parse(&body)["status"], "Processing");
    }
}

#[actix_web::test]
async fn non_owner_cannot_fetch_an_order() {
    for uri in ["/api/orders/order-1", "/api/orders/order-1/history"] {
        let mut store = MockOrderStore::new();
        store.expect_fetch_order_by_id().returning(|_| Ok(Some(order("order-1", "alice", OrderStatusType::Pending))));
        store.expect_fetch_status_history().never();
        let req = TestRequest::get().uri(uri);
        let (status, body) = send(with_token(req, &token_for("bob", Role::Buyer)), store).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}: {body}");
    }
}

#[actix_web::test]
async fn missing_order_is_404() {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_id().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/api/orders/nope");
    let (status, body) = send(with_token(req, &token_for("ann", Role::Admin)), store).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order #nope does not exist"}"#);
}

#[actix_web::test]
async fn invalid_transition_is_409() {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_id().returning(|_| Ok(Some(order("order-1", "alice", OrderStatusType::Pending))));
    store.expect_update_order_status().never();
    let req = TestRequest::put().uri("/api/orders/order-1/ship");
    let (status, body) = send(with_token(req, &token_for("ann", Role::Admin)), store).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("Cannot move an order from Pending to Shipped as admin"), "{body}");
}

#[actix_web::test]
async fn confirm_delivery_sets_the_commission() {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_id().returning(|_| Ok(Some(order("order-1", "alice", OrderStatusType::Shipped))));
    store
        .expect_update_order_status()
        .withf(|id, change| {
            id == &OrderId::from("order-1") &&
                change.from == OrderStatusType::Shipped &&
                change.to == OrderStatusType::Delivered &&
                change.actor_id == "alice" &&
                change.commission == Some(Money::from_minor(300))
        })
        .times(1)
        .returning(|id, change| {
            let mut order = order(id.as_str(), "alice", change.to);
            order.commission = change.commission;
            Ok(Some(order))
        });
    let req = TestRequest::put().uri("/api/orders/order-1/confirm-delivery");
    let (status, body) = send(with_token(req, &token_for("alice", Role::Buyer)), store).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = parse(&body);
    assert_eq!(order["status"], "Delivered");
    assert_eq!(order["commission"], 3.0);
}

#[actix_web::test]
async fn commission_on_undelivered_order_is_409() {
    let mut store = MockOrderStore::new();
    store.expect_fetch_order_by_id().returning(|_| Ok(Some(order("order-1", "alice", OrderStatusType::Shipped))));
    store.expect_update_commission().never();
    let req = TestRequest::put().uri("/api/orders/order-1/commission");
    let (status, body) = send(with_token(req, &token_for("ann", Role::Admin)), store).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[actix_web::test]
async fn store_errors_are_hidden() {
    let mut store = MockOrderStore::new();
    store
        .expect_fetch_orders_for_user()
        .returning(|_| Err(OrderStoreError::DatabaseError("disk I/O error at /var/lib/orders.db".into())));
    let req = TestRequest::get().uri("/api/orders/mine");
    let (status, body) = send(with_token(req, &token_for("alice", Role::Buyer)), store).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("disk I/O"), "Store details leaked: {body}");
    assert!(parse(&body)["error"].is_string());
}

#[actix_web::test]
async fn search_passes_the_filter_to_the_store() {
    let mut store = MockOrderStore::new();
    store
        .expect_search_orders()
        .withf(|q| {
            q.user_id.as_deref() == Some("alice") &&
                q.status == Some(vec![OrderStatusType::Shipped, OrderStatusType::Delivered]) &&
                q.since.is_some() &&
                q.until.is_none()
        })
        .times(1)
        .returning(|_| Ok(vec![order("a", "alice", OrderStatusType::Shipped)]));
    let req =
        TestRequest::get().uri("/api/orders/search?user_id=alice&status=Shipped,delivered&since=2024-03-01T00:00:00Z");
    let (status, body) = send(with_token(req, &token_for("ann", Role::Admin)), store).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(parse(&body)[0]["id"], "a");
}

#[actix_web::test]
async fn search_with_unknown_status_is_400() {
    let mut store = MockOrderStore::new();
    store.expect_search_orders().never();
    let req = TestRequest::get().uri("/api/orders/search?status=Lost");
    let (status, body) = send(with_token(req, &token_for("ann", Role::Admin)), store).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid order status: Lost"), "{body}");
}
