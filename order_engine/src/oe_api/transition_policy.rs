//! The order status state machine.
//!
//! | Current          | Next             | Role    |
//! |------------------|------------------|---------|
//! | Pending          | Processing       | admin   |
//! | Pending          | Canceled         | admin   |
//! | Processing       | ReadyForDelivery | partner |
//! | Processing       | Canceled         | admin   |
//! | ReadyForDelivery | Shipped          | admin   |
//! | Shipped          | Delivered        | buyer   |
//!
//! Any other combination is rejected. `Delivered` and `Canceled` are terminal.
use crate::db_types::{OrderStatusType, Role};

/// The transitions out of `current`, with the single role that may perform each one.
pub fn transitions_from(current: OrderStatusType) -> &'static [(OrderStatusType, Role)] {
    use OrderStatusType::*;
    match current {
        Pending => &[(Processing, Role::Admin), (Canceled, Role::Admin)],
        Processing => &[(ReadyForDelivery, Role::Partner), (Canceled, Role::Admin)],
        ReadyForDelivery => &[(Shipped, Role::Admin)],
        Shipped => &[(Delivered, Role::Buyer)],
        Delivered | Canceled => &[],
    }
}

/// The role required to move an order from `current` to `next`, or `None` if no role may make that move.
pub fn required_role(current: OrderStatusType, next: OrderStatusType) -> Option<Role> {
    transitions_from(current).iter().find(|(to, _)| *to == next).map(|(_, role)| *role)
}

pub fn is_transition_allowed(current: OrderStatusType, next: OrderStatusType, role: Role) -> bool {
    required_role(current, next) == Some(role)
}
