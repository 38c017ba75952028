//! Application layer - command handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::approval::{
    CallbackDispatcher, DecideOrderHandler, DecisionOutcome, DispatchOutcome, ProvisioningEngine,
    RequestReviewCommand, RequestReviewError, RequestReviewHandler,
};
