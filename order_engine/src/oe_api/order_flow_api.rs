use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Money, NewOrder, NewOrderItem, Order, OrderId, OrderStatusChange, OrderStatusType, Role, StatusChange},
    oe_api::{
        errors::OrderFlowError,
        order_objects::{OrderCreateRequest, OrderQueryFilter},
        transition_policy::is_transition_allowed,
    },
    traits::{OrderManagement, OrderStoreError, PriceSource, PricingError},
};

/// The default commission rate, in basis points (10%).
pub const DEFAULT_COMMISSION_RATE_BPS: u32 = 1_000;

/// `OrderFlowApi` is the primary API for placing orders and moving them through their lifecycle.
///
/// It holds no state of its own. Every call reads from and writes to the order store `B`, and new orders are priced
/// with `P`. The transitions it will make are described in [`crate::transition_policy`]. When an order reaches
/// `Delivered`, its commission is written in the same transaction as the status change.
pub struct OrderFlowApi<B, P> {
    db: B,
    prices: P,
    commission_rate_bps: u32,
}

impl<B, P> Debug for OrderFlowApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi (commission: {}bps)", self.commission_rate_bps)
    }
}

impl<B, P> OrderFlowApi<B, P> {
    pub fn new(db: B, prices: P) -> Self {
        Self { db, prices, commission_rate_bps: DEFAULT_COMMISSION_RATE_BPS }
    }

    pub fn with_commission_rate(mut self, bps: u32) -> Self {
        self.commission_rate_bps = bps;
        self
    }

    pub fn commission_rate_bps(&self) -> u32 {
        self.commission_rate_bps
    }

    /// The commission owed on an order with the given total.
    pub fn commission_for(&self, total: Money) -> Money {
        total.apply_rate_bps(self.commission_rate_bps)
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B, P> OrderFlowApi<B, P>
where
    B: OrderManagement,
    P: PriceSource,
{
    /// Places a new order for `user_id`.
    ///
    /// Each item is priced using the price source, and the order total is the sum of the line totals. The order and
    /// its items are written in one transaction and the new order is `Pending`.
    pub async fn create_order(&self, user_id: &str, request: OrderCreateRequest) -> Result<Order, OrderFlowError> {
        request.validate()?;
        let mut items = Vec::with_capacity(request.items.len());
        for line in request.items {
            let unit_price = self.prices.unit_price(&line.product_id).await?;
            if unit_price.is_negative() {
                error!("🔄️📦️ Refusing the quoted price of {unit_price} for {}", line.product_id);
                return Err(PricingError::NegativePrice(line.product_id, unit_price).into());
            }
            trace!("🔄️📦️ {} x {} @ {unit_price}", line.quantity, line.product_id);
            items.push(NewOrderItem::new(line.product_id, line.quantity, unit_price));
        }
        let order = NewOrder::from_items(user_id, items)
            .ok_or_else(|| OrderFlowError::ValidationError("The order total is too large".into()))?;
        let order = self.db.insert_order(order).await?;
        info!("🔄️📦️ Order {} created for {user_id}. Total: {}", order.id, order.total_amount);
        Ok(order)
    }

    /// Fetches an order. Only the owner of the order, or an admin, may see it.
    pub async fn fetch_order(&self, order_id: &OrderId, user_id: &str, is_admin: bool) -> Result<Order, OrderFlowError> {
        let order = self.order_or_not_found(order_id).await?;
        if !is_admin && !order.is_owned_by(user_id) {
            debug!("🔄️🔒️ {user_id} tried to access order {order_id}, which belongs to {}", order.user_id);
            return Err(OrderFlowError::ForbiddenError(order_id.clone()));
        }
        Ok(order)
    }

    pub async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        trace!("🔄️📦️ {} orders fetched for {user_id}", orders.len());
        Ok(orders)
    }

    /// Every order in the system. Callers are responsible for restricting this to administrators.
    pub async fn all_orders(&self) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_all_orders().await?;
        Ok(orders)
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        trace!("🔄️🔍️ Searching orders. {query}");
        let orders = self.db.search_orders(query).await?;
        Ok(orders)
    }

    /// Moves an order to `next`, acting as `user_id` with the given role.
    ///
    /// Permission depends only on the current status and the role, not on who owns the order. The status is written
    /// with a compare-and-set on the status that was read here. If another request changed the order in the
    /// meantime, this call fails with `InvalidTransition` from the order's new status.
    ///
    /// Moving to `Delivered` also sets the commission, in the same transaction.
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        next: OrderStatusType,
        user_id: &str,
        role: Role,
    ) -> Result<Order, OrderFlowError> {
        let order = self.order_or_not_found(order_id).await?;
        let current = order.status;
        if !is_transition_allowed(current, next, role) {
            debug!("🔄️🚫️ {user_id} ({role}) may not move order {order_id} from {current} to {next}");
            return Err(OrderFlowError::InvalidTransition { from: current, to: next, role });
        }
        let mut change = StatusChange::new(current, next, user_id, role);
        if next == OrderStatusType::Delivered {
            change = change.with_commission(self.commission_for(order.total_amount));
        }
        match self.db.update_order_status(order_id, change).await {
            Ok(Some(updated)) => {
                info!("🔄️✅️ Order {order_id} moved from {current} to {next} by {user_id} ({role})");
                Ok(updated)
            },
            Ok(None) => {
                let now = self.order_or_not_found(order_id).await?.status;
                warn!("🔄️⚠️ Order {order_id} changed from {current} to {now} while {user_id} was moving it to {next}");
                Err(OrderFlowError::InvalidTransition { from: now, to: next, role })
            },
            Err(OrderStoreError::OrderNotFound(id)) => Err(OrderFlowError::NotFoundError(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Computes the commission for a delivered order and stores it.
    ///
    /// Orders are given their commission when they are delivered, so this is only needed to repair orders that have
    /// none. Calling it repeatedly on the same order gives the same result.
    pub async fn calculate_and_set_commission(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let order = self.order_or_not_found(order_id).await?;
        if order.status != OrderStatusType::Delivered {
            return Err(OrderFlowError::InvalidState { order_id: order_id.clone(), status: order.status });
        }
        let commission = self.commission_for(order.total_amount);
        match self.db.update_commission(order_id, commission).await {
            Ok(Some(updated)) => {
                info!("🔄️💰️ Commission of {commission} set on order {order_id}");
                Ok(updated)
            },
            Ok(None) => {
                let status = self.order_or_not_found(order_id).await?.status;
                Err(OrderFlowError::InvalidState { order_id: order_id.clone(), status })
            },
            Err(OrderStoreError::OrderNotFound(id)) => Err(OrderFlowError::NotFoundError(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// The status transitions of an order, oldest first. Visible to the same callers as the order itself.
    pub async fn status_history(
        &self,
        order_id: &OrderId,
        user_id: &str,
        is_admin: bool,
    ) -> Result<Vec<OrderStatusChange>, OrderFlowError> {
        let _order = self.fetch_order(order_id, user_id, is_admin).await?;
        let history = self.db.fetch_status_history(order_id).await?;
        Ok(history)
    }

    async fn order_or_not_found(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        self.db.fetch_order_by_id(order_id).await?.ok_or_else(|| OrderFlowError::NotFoundError(order_id.clone()))
    }
}
