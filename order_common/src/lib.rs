mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, BASIS_POINTS_PER_UNIT, MINOR_UNITS_PER_MAJOR};
pub use secret::Secret;
