//! Order status state machine.
//!
//! `PENDING_PAYMENT → PENDING_REVIEW → {COMPLETED | REJECTED}`. The two
//! decided states are terminal.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a customer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Items chosen, no receipt yet.
    PendingPayment,

    /// Receipt submitted; waiting for an administrator decision.
    PendingReview,

    /// Approved and provisioned.
    Completed,

    /// Declined by an administrator.
    Rejected,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::PendingPayment,
        OrderStatus::PendingReview,
        OrderStatus::Completed,
        OrderStatus::Rejected,
    ];

    /// Storage and wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::PendingReview => "PENDING_REVIEW",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Rejected => "REJECTED",
        }
    }

    /// True only for the state the approval workflow acts on.
    pub fn is_awaiting_review(&self) -> bool {
        *self == OrderStatus::PendingReview
    }

    /// True once an administrator decision has been committed.
    pub fn is_decided(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Rejected)
    }
}

impl StateMachine for OrderStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            PendingPayment => vec![PendingReview],
            PendingReview => vec![Completed, Rejected],
            Completed | Rejected => vec![],
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::invalid_format("status", format!("unknown order status '{}'", s)))
    }
}
