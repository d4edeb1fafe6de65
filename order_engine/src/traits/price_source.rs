use thiserror::Error;

use crate::db_types::{Money, ProductId};

#[derive(Debug, Clone, Error)]
pub enum PricingError {
    #[error("Product {0} is not known to the price source")]
    UnknownProduct(ProductId),
    #[error("The price source quoted {1} for product {0}. Unit prices cannot be negative")]
    NegativePrice(ProductId, Money),
    #[error("The price source is unavailable: {0}")]
    Unavailable(String),
}

/// A source of unit prices for products. Prices are snapshotted onto the order items when an order is created, so
/// later price changes never affect existing orders.
#[allow(async_fn_in_trait)]
pub trait PriceSource {
    async fn unit_price(&self, product_id: &ProductId) -> Result<Money, PricingError>;
}
