use std::time::Duration;

use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::Logger,
    web,
    web::ServiceConfig,
    App,
    HttpServer,
};
use log::*;
use order_engine::{
    traits::{OrderManagement, PriceSource},
    FixedPrice,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::ServerError,
    middleware::AccessGateFactory,
    routes::{
        health,
        AllOrdersRoute,
        CancelOrderRoute,
        ConfirmDeliveryRoute,
        ConfirmReadyRoute,
        CreateOrderRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        OrderHistoryRoute,
        ProcessOrderRoute,
        RecomputeCommissionRoute,
        SearchOrdersRoute,
        ShipOrderRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🗃️ Connected to {}", db.url());
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), FixedPrice(config.unit_price))
            .with_commission_rate(config.commission_rate_bps);
        let verifier = TokenVerifier::new(&config.auth);
        let log_format = if config.use_x_forwarded_for {
            "%t (%D ms) %s %{r}a %{Host}i %r"
        } else {
            "%t (%D ms) %s %a %{Host}i %r"
        };
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(AccessGateFactory::new(verifier))
            .configure(configure_order_routes::<SqliteDatabase, FixedPrice>);
        App::new()
            .wrap(Logger::new(log_format).log_target("orders::access_log"))
            .app_data(web::Data::new(orders_api))
            .configure(configure_extractors)
            .service(health)
            .service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the order routes. The literal paths (`/orders/mine`, `/orders/search`) must be registered before
/// `/orders/{id}`, which would otherwise capture them.
pub fn configure_order_routes<B, P>(cfg: &mut ServiceConfig)
where
    B: OrderManagement + 'static,
    P: PriceSource + 'static,
{
    cfg.service(CreateOrderRoute::<B, P>::new())
        .service(AllOrdersRoute::<B, P>::new())
        .service(MyOrdersRoute::<B, P>::new())
        .service(SearchOrdersRoute::<B, P>::new())
        .service(OrderByIdRoute::<B, P>::new())
        .service(OrderHistoryRoute::<B, P>::new())
        .service(ProcessOrderRoute::<B, P>::new())
        .service(CancelOrderRoute::<B, P>::new())
        .service(ConfirmReadyRoute::<B, P>::new())
        .service(ShipOrderRoute::<B, P>::new())
        .service(ConfirmDeliveryRoute::<B, P>::new())
        .service(RecomputeCommissionRoute::<B, P>::new());
}

/// Extractor failures (malformed JSON, bad query strings) are reported with the same JSON error body as every other
/// error.
pub fn configure_extractors(cfg: &mut ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into()),
    )
    .app_data(web::QueryConfig::default().error_handler(|err, _req| ServerError::InvalidQuery(err.to_string()).into()))
    .app_data(
        web::PathConfig::default().error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into()),
    );
}
