use actix_web::{
    body::MessageBody,
    http::{header::AUTHORIZATION, StatusCode},
    test,
    test::TestRequest,
    web,
    App,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use log::debug;
use order_engine::{
    db_types::{Money, NewOrder, Order, OrderId, OrderItem, OrderStatusType, ProductId, Role},
    FixedPrice,
    OrderFlowApi,
};

use super::mocks::MockOrderStore;
use crate::{
    auth::{JwtClaims, TokenIssuer, TokenVerifier},
    config::AuthConfig,
    middleware::AccessGateFactory,
    routes::health,
    server::{configure_extractors, configure_order_routes},
};

// A test-only secret. DO NOT re-use it anywhere.
const TEST_JWT_SECRET: &str = "5f0c1e8d2b7a4c39e6d1f0a8b3c2e7d49a1b0c3d";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET, Duration::hours(1))
}

pub fn token_for(user_id: &str, role: Role) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(JwtClaims::new(user_id, role)).expect("Failed to sign token")
}

pub fn expired_token_for(user_id: &str, role: Role) -> String {
    TokenIssuer::new(&get_auth_config())
        .issue_token_expiring_at(JwtClaims::new(user_id, role), Utc::now() - Duration::hours(2))
        .expect("Failed to sign token")
}

pub fn with_token(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header((AUTHORIZATION, format!("Bearer {token}")))
}

/// Sends `req` to an app laid out like the real server, backed by `store`. Errors raised by middleware are rendered
/// the same way the HTTP dispatcher would render them.
pub async fn send(req: TestRequest, store: MockOrderStore) -> (StatusCode, String) {
    let _ = env_logger::try_init();
    let api = OrderFlowApi::new(store, FixedPrice::default());
    let verifier = TokenVerifier::new(&get_auth_config());
    let app = App::new().configure(configure_extractors).app_data(web::Data::new(api)).service(health).service(
        web::scope("/api")
            .wrap(AccessGateFactory::new(verifier))
            .configure(configure_order_routes::<MockOrderStore, FixedPrice>),
    );
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().expect("Body is not in memory")).into_owned();
    (status, body)
}

pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// A 3 x `p1` order at 10.00 each.
pub fn order(id: &str, user_id: &str, status: OrderStatusType) -> Order {
    Order {
        id: OrderId::from(id),
        user_id: user_id.to_string(),
        total_amount: Money::from_minor(3000),
        status,
        commission: None,
        created_at: timestamp(),
        updated_at: timestamp(),
        items: vec![OrderItem {
            id: 1,
            order_id: OrderId::from(id),
            product_id: ProductId::from("p1"),
            quantity: 3,
            unit_price: Money::from_minor(1000),
        }],
    }
}

/// What the store would hand back after inserting `new_order`.
pub fn stored(new_order: NewOrder) -> Order {
    let id = OrderId::from("order-1");
    let items = new_order
        .items
        .into_iter()
        .enumerate()
        .map(|(i, item)| OrderItem {
            id: i as i64 + 1,
            order_id: id.clone(),
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        })
        .collect();
    Order {
        id,
        user_id: new_order.user_id,
        total_amount: new_order.total_amount,
        status: OrderStatusType::Pending,
        commission: None,
        created_at: timestamp(),
        updated_at: timestamp(),
        items,
    }
}
