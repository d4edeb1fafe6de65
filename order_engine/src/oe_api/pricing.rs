use std::collections::HashMap;

use crate::{
    db_types::{Money, ProductId},
    traits::{PriceSource, PricingError},
};

pub const DEFAULT_UNIT_PRICE: Money = Money::from_major(10);

/// Prices every product at the same unit price. Stands in for the product catalogue.
#[derive(Debug, Clone, Copy)]
pub struct FixedPrice(pub Money);

impl Default for FixedPrice {
    fn default() -> Self {
        Self(DEFAULT_UNIT_PRICE)
    }
}

impl PriceSource for FixedPrice {
    async fn unit_price(&self, _product_id: &ProductId) -> Result<Money, PricingError> {
        Ok(self.0)
    }
}

/// A fixed price list. Products that are not on the list are unknown.
#[derive(Debug, Clone, Default)]
pub struct PriceList {
    prices: HashMap<ProductId, Money>,
}

impl PriceList {
    pub fn with_price<P: Into<ProductId>>(mut self, product_id: P, price: Money) -> Self {
        self.prices.insert(product_id.into(), price);
        self
    }
}

impl PriceSource for PriceList {
    async fn unit_price(&self, product_id: &ProductId) -> Result<Money, PricingError> {
        self.prices.get(product_id).copied().ok_or_else(|| PricingError::UnknownProduct(product_id.clone()))
    }
}
