//! HTTP adapter for the approval workflow.
//!
//! Exposes the Telegram webhook ingress, the review-request trigger and a
//! health check.

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, HealthResponse, ReviewRequestResponse};
pub use handlers::{
    secret_matches, ApprovalApiError, ApprovalAppState, INTERNAL_TOKEN_HEADER,
    TELEGRAM_SECRET_HEADER,
};
pub use routes::approval_router;
