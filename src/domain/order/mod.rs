//! Order domain module.
//!
//! - `aggregate` - Order and OrderItem
//! - `status` - OrderStatus state machine
//! - `decision` - Approve/reject decisions
//! - `duration` - Whole-month subscription durations
//! - `payment_method` - Recorded payment method

mod aggregate;
mod decision;
mod duration;
mod payment_method;
mod status;

pub use aggregate::{Order, OrderItem};
pub use decision::Decision;
pub use duration::DurationMonths;
pub use payment_method::PaymentMethod;
pub use status::OrderStatus;

#[cfg(test)]
pub(crate) use aggregate::test_support;
