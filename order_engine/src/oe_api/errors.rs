use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType, Role},
    traits::{OrderStoreError, PricingError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("Order {0} does not exist")]
    NotFoundError(OrderId),
    #[error("Access to order {0} is not permitted")]
    ForbiddenError(OrderId),
    #[error("Cannot move an order from {from} to {to} as {role}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType, role: Role },
    #[error("Order {order_id} is {status}, which does not allow this operation")]
    InvalidState { order_id: OrderId, status: OrderStatusType },
    #[error("Could not price the order: {0}")]
    PricingError(PricingError),
    #[error("{0}")]
    StoreError(#[from] OrderStoreError),
}

impl From<PricingError> for OrderFlowError {
    fn from(e: PricingError) -> Self {
        match e {
            PricingError::UnknownProduct(id) => Self::ValidationError(format!("Product {id} does not exist")),
            e => Self::PricingError(e),
        }
    }
}
