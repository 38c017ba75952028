//! Approval handlers.
//!
//! ## Commands
//! - Deciding an order (approve/reject) with provisioning
//! - Dispatching admin button presses to the decision workflow
//! - (Re)sending the admin review request

mod decide_order;
mod dispatch_callback;
mod provisioning;
mod request_review;

pub use decide_order::{DecideOrderHandler, DecisionOutcome};
pub use dispatch_callback::{CallbackDispatcher, DispatchOutcome};
pub use provisioning::{ProvisionError, ProvisioningEngine};
pub use request_review::{
    RequestReviewCommand, RequestReviewError, RequestReviewHandler,
};
