//! Request handler definitions
//!
//! Define each route and its handler here. Every route except `/health` is mounted under `/api`, behind the access
//! gate, so the handlers can rely on the caller's [`JwtClaims`] being present.
//!
//! Role checks happen in two places:
//! * Routes that only one role may call carry an ACL (`where requires [...]`). The ACL rejects other callers with a
//!   403 before the handler, and therefore the order store, is reached.
//! * Everything else is decided by the order flow API: ownership for reads, and the transition policy for status
//!   changes.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. All store access is asynchronous, so keep it that way.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use order_engine::{
    db_types::{OrderId, OrderStatusType, Role},
    order_objects::OrderCreateRequest,
    traits::{OrderManagement, PriceSource},
    OrderFlowApi,
};

use crate::{auth::JwtClaims, data_objects::SearchParams, errors::ServerError};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        $crate::route!(@define $name => $method $path impl $($bounds),+ where requires []);
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),*]) => {
        $crate::route!(@define $name => $method $path impl $($bounds),+ where requires [$($roles),*]);
    };

    (@define $name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds >], )+ >( $( core::marker::PhantomData<fn() -> [< T $bounds >]>, )+ ); }
        paste::paste! { impl< $( [< T $bounds >], )+ > [<$name:camel Route>]< $( [< T $bounds >], )+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self( $( core::marker::PhantomData::<fn() -> [< T $bounds >]>, )+ )
            }
        }}
        paste::paste! { impl< $( [< T $bounds >], )+ > actix_web::dev::HttpServiceFactory for [<$name:camel Route>]< $( [< T $bounds >], )+ >
        where
            $( [< T $bounds >]: $bounds + 'static, )+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let roles: &[order_engine::db_types::Role] = &[$($roles),*];
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds >], )+ >);
                if roles.is_empty() {
                    actix_web::dev::HttpServiceFactory::register(res, config);
                } else {
                    let res = res.wrap($crate::middleware::AclMiddlewareFactory::new(roles));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }}
    };
}

/// The flow API as shared between workers.
type Api<B, P> = web::Data<OrderFlowApi<B, P>>;

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl OrderManagement, PriceSource);
/// Places a new order for the caller. Any authenticated user may place an order.
pub async fn create_order<B: OrderManagement, P: PriceSource>(
    claims: JwtClaims,
    body: web::Json<OrderCreateRequest>,
    api: Api<B, P>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST order for {} with {} items", claims.user_id, request.items.len());
    let order = api.create_order(&claims.user_id, request).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(all_orders => Get "/orders" impl OrderManagement, PriceSource where requires [Role::Admin]);
pub async fn all_orders<B: OrderManagement, P: PriceSource>(api: Api<B, P>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET all orders");
    let orders = api.all_orders().await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(my_orders => Get "/orders/mine" impl OrderManagement, PriceSource);
/// The caller's own orders, oldest first.
pub async fn my_orders<B: OrderManagement, P: PriceSource>(
    claims: JwtClaims,
    api: Api<B, P>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for {}", claims.user_id);
    let orders = api.orders_for_user(&claims.user_id).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(search_orders => Get "/orders/search" impl OrderManagement, PriceSource where requires [Role::Admin]);
/// Search orders by owner, status and creation time.
///
/// e.g. `/api/orders/search?user_id=alice&status=Shipped,Delivered&since=2024-03-01T00:00:00Z`
pub async fn search_orders<B: OrderManagement, P: PriceSource>(
    query: web::Query<SearchParams>,
    api: Api<B, P>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner().into_filter()?;
    debug!("💻️ GET search orders. {filter}");
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl OrderManagement, PriceSource);
/// Only the order's owner, or an admin, may fetch it. Other callers get a 403, whether or not they could have
/// guessed the id.
pub async fn order_by_id<B: OrderManagement, P: PriceSource>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: Api<B, P>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id} for {}", claims.user_id);
    let order = api.fetch_order(&order_id, &claims.user_id, claims.role.is_admin()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_history => Get "/orders/{id}/history" impl OrderManagement, PriceSource);
pub async fn order_history<B: OrderManagement, P: PriceSource>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: Api<B, P>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET history of order {order_id} for {}", claims.user_id);
    let history = api.status_history(&order_id, &claims.user_id, claims.role.is_admin()).await?;
    Ok(HttpResponse::Ok().json(history))
}

// ----------------------------------------------   Status changes  ----------------------------------------------------
route!(process_order => Put "/orders/{id}/process" impl OrderManagement, PriceSource where requires [Role::Admin]);
pub async fn process_order<B: OrderManagement, P: PriceSource>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: Api<B, P>,
) -> Result<HttpResponse, ServerError> {
    move_order(claims, path.into_inner(), OrderStatusType::Processing, api.get_ref()).await
}

route!(cancel_order => Put "/orders/{id}/cancel" impl OrderManagement, PriceSource where requires [Role::Admin]);
pub async fn cancel_order<B: OrderManagement, P: PriceSource>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: Api<B, P>,
) -> Result<HttpResponse, ServerError> {
    move_order(claims, path.into_inner(), OrderStatusType::Canceled, api.get_ref()).await
}

route!(confirm_ready => Put "/orders/{id}/confirm-ready" impl OrderManagement, PriceSource where requires [Role::Partner]);
pub async fn confirm_ready<B: OrderManagement, P: PriceSource>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: Api<B, P>,
) -> Result<HttpResponse, ServerError> {
    move_order(claims, path.into_inner(), OrderStatusType::ReadyForDelivery, api.get_ref()).await
}

route!(ship_order => Put "/orders/{id}/ship" impl OrderManagement, PriceSource where requires [Role::Admin]);
pub async fn ship_order<B: OrderManagement, P: PriceSource>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: Api<B, P>,
) -> Result<HttpResponse, ServerError> {
    move_order(claims, path.into_inner(), OrderStatusType::Shipped, api.get_ref()).await
}

route!(confirm_delivery => Put "/orders/{id}/confirm-delivery" impl OrderManagement, PriceSource where requires [Role::Buyer]);
/// The buyer confirms that the order arrived. The commission is set in the same step.
pub async fn confirm_delivery<B: OrderManagement, P: PriceSource>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: Api<B, P>,
) -> Result<HttpResponse, ServerError> {
    move_order(claims, path.into_inner(), OrderStatusType::Delivered, api.get_ref()).await
}

route!(recompute_commission => Put "/orders/{id}/commission" impl OrderManagement, PriceSource where requires [Role::Admin]);
/// Sets the commission on a delivered order that has none. Safe to repeat.
pub async fn recompute_commission<B: OrderManagement, P: PriceSource>(
    path: web::Path<OrderId>,
    api: Api<B, P>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ PUT commission for order {order_id}");
    let order = api.calculate_and_set_commission(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn move_order<B: OrderManagement, P: PriceSource>(
    claims: JwtClaims,
    order_id: OrderId,
    next: OrderStatusType,
    api: &OrderFlowApi<B, P>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PUT order {order_id} -> {next} by {} ({})", claims.user_id, claims.role);
    let order = api.update_order_status(&order_id, next, &claims.user_id, claims.role).await?;
    Ok(HttpResponse::Ok().json(order))
}
