//! Administrator decision on a submitted order.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::OrderStatus;

/// Outcome an administrator picks for an order under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Token prefix used in callback data.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }

    /// Terminal status this decision moves an order into.
    pub fn target_status(&self) -> OrderStatus {
        match self {
            Decision::Approve => OrderStatus::Completed,
            Decision::Reject => OrderStatus::Rejected,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
