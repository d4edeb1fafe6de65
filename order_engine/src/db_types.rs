use std::{convert::Infallible, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use order_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The lifecycle state of an order.
///
/// The same PascalCase labels are used in storage and on the wire. Parsing ignores case, so rows written with
/// lowercase labels (e.g. `pending`) are read back as the canonical variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OrderStatusType {
    /// The order has been placed and is waiting for an administrator to accept it.
    Pending,
    /// The order has been accepted and is being prepared by the partner.
    Processing,
    /// The partner has confirmed that the order is ready to be handed to the courier.
    ReadyForDelivery,
    /// The order is in transit.
    Shipped,
    /// The buyer has confirmed receipt. Terminal.
    Delivered,
    /// The order was canceled by an administrator. Terminal.
    Canceled,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 6] = [
        OrderStatusType::Pending,
        OrderStatusType::Processing,
        OrderStatusType::ReadyForDelivery,
        OrderStatusType::Shipped,
        OrderStatusType::Delivered,
        OrderStatusType::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::Pending => "Pending",
            OrderStatusType::Processing => "Processing",
            OrderStatusType::ReadyForDelivery => "ReadyForDelivery",
            OrderStatusType::Shipped => "Shipped",
            OrderStatusType::Delivered => "Delivered",
            OrderStatusType::Canceled => "Canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Delivered | OrderStatusType::Canceled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(['_', '-', ' '], "");
        OrderStatusType::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ConversionError(format!("Invalid order status: {s}")))
    }
}

impl TryFrom<String> for OrderStatusType {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderStatusType> for String {
    fn from(value: OrderStatusType) -> Self {
        value.to_string()
    }
}

//--------------------------------------        Role           ---------------------------------------------------------
/// The role an authenticated actor holds. Roles are lowercase in tokens and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Partner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Partner => "partner",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "partner" => Ok(Self::Partner),
            "admin" => Ok(Self::Admin),
            _ => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       ProductId       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: String,
    pub total_amount: Money,
    #[sqlx(try_from = "String")]
    pub status: OrderStatusType,
    /// `None` until the order has been delivered and its commission computed
    pub commission: Option<Money>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn with_items(mut self, items: Vec<OrderItem>) -> Self {
        self.items = items;
        self
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id &&
            self.user_id == other.user_id &&
            self.total_amount == other.total_amount &&
            self.status == other.status &&
            self.commission == other.commission &&
            self.items == other.items
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// The unit price at the time the order was placed
    pub unit_price: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
/// A fully priced order, ready to be written to the store. The store assigns the id and timestamps, and every new
/// order starts out as `Pending`.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub total_amount: Money,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    /// Builds a new order from its items. The total is the sum of the line totals, or `None` if it overflows.
    pub fn from_items(user_id: impl Into<String>, items: Vec<NewOrderItem>) -> Option<Self> {
        let total_amount = items
            .iter()
            .try_fold(Money::default(), |total, item| total.checked_add(item.unit_price.checked_mul(item.quantity)?))?;
        Some(Self { user_id: user_id.into(), total_amount, items })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrderItem {
    pub fn new(product_id: ProductId, quantity: i64, unit_price: Money) -> Self {
        Self { product_id, quantity, unit_price }
    }
}

//--------------------------------------     StatusChange      ---------------------------------------------------------
/// A request to the store to move an order from `from` to `to`. The store only applies the change if the order is
/// still in the `from` state when the write happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub from: OrderStatusType,
    pub to: OrderStatusType,
    pub actor_id: String,
    pub actor_role: Role,
    /// Written in the same transaction as the status, if present
    pub commission: Option<Money>,
}

impl StatusChange {
    pub fn new(from: OrderStatusType, to: OrderStatusType, actor_id: impl Into<String>, actor_role: Role) -> Self {
        Self { from, to, actor_id: actor_id.into(), actor_role, commission: None }
    }

    pub fn with_commission(mut self, commission: Money) -> Self {
        self.commission = Some(commission);
        self
    }
}

//--------------------------------------  OrderStatusChange    ---------------------------------------------------------
/// An entry in the audit trail of an order's status transitions.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderStatusChange {
    pub id: i64,
    pub order_id: OrderId,
    #[sqlx(try_from = "String")]
    pub old_status: OrderStatusType,
    #[sqlx(try_from = "String")]
    pub new_status: OrderStatusType,
    pub actor_id: String,
    #[sqlx(try_from = "String")]
    pub actor_role: Role,
    pub changed_at: DateTime<Utc>,
}
