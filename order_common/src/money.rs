use std::{
    fmt::Display,
    iter::Sum,
    ops::Add,
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const MINOR_UNITS_PER_MAJOR: i64 = 100;
pub const BASIS_POINTS_PER_UNIT: i64 = 10_000;

//--------------------------------------       Money         ---------------------------------------------------------
/// A monetary amount, held as a whole number of minor currency units (cents).
///
/// Amounts are stored as integers so that totals and commissions are exact. On the wire, `Money` is written as a
/// decimal number of major units, i.e. `Money::from_minor(3000)` serializes as `30.0`.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a monetary amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Money {
    pub const fn from_minor(value: i64) -> Self {
        Self(value)
    }

    pub const fn from_major(value: i64) -> Self {
        Self(value * MINOR_UNITS_PER_MAJOR)
    }

    /// The amount in minor units
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_mul(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Self)
    }

    /// Applies a rate, given in basis points, to this amount. The result is rounded half away from zero to the
    /// nearest minor unit and saturates at the bounds of `i64`.
    ///
    /// `Money::from_major(30).apply_rate_bps(1_000)` is 10% of 30.00, i.e. 3.00.
    pub fn apply_rate_bps(self, bps: u32) -> Self {
        let scaled = i128::from(self.0) * i128::from(bps);
        let half = i128::from(BASIS_POINTS_PER_UNIT / 2);
        let divisor = i128::from(BASIS_POINTS_PER_UNIT);
        let rounded = if scaled >= 0 { (scaled + half) / divisor } else { (scaled - half) / divisor };
        let value = i64::try_from(rounded).unwrap_or(if rounded < 0 { i64::MIN } else { i64::MAX });
        Self(value)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / MINOR_UNITS_PER_MAJOR as f64
    }

    /// Converts a decimal amount in major units to `Money`, rounding to the nearest minor unit.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn try_from_major(value: f64) -> Result<Self, MoneyConversionError> {
        let minor = (value * MINOR_UNITS_PER_MAJOR as f64).round();
        if !minor.is_finite() || minor >= i64::MAX as f64 || minor <= i64::MIN as f64 {
            return Err(MoneyConversionError(format!("{value} is out of range")));
        }
        Ok(Self(minor as i64))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_major = MINOR_UNITS_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per_major, abs % per_major)
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<f64>().map_err(|e| MoneyConversionError(format!("{s}: {e}")))?;
        Self::try_from_major(value)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::try_from_major(value).map_err(de::Error::custom)
    }
}
