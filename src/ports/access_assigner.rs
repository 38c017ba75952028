//! Access assignment port.
//!
//! Yields the account-access details delivered with each subscription. It runs
//! inside the approval transaction after stock has been checked, so it must
//! not block on I/O.

use crate::domain::catalog::Product;
use crate::domain::order::{Order, OrderItem};
use crate::domain::subscription::AccessDetails;

pub trait AccessAssigner: Send + Sync {
    /// Access details for line `line` of `order`.
    fn assign(&self, product: &Product, item: &OrderItem, order: &Order, line: usize)
        -> AccessDetails;
}
