//! Axum router for the approval endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{health, request_review, telegram_webhook, ApprovalAppState};

/// Create the approval router.
///
/// # Routes
/// - `GET /health` - Liveness
/// - `POST /webhooks/telegram` - Telegram updates (secret token verified)
/// - `POST /orders/:order_id/review-request` - Resend review buttons
///   (internal token required)
pub fn approval_router() -> Router<ApprovalAppState> {
    Router::new()
        .route("/health", get(health))
        .route("/webhooks/telegram", post(telegram_webhook))
        .route("/orders/:order_id/review-request", post(request_review))
}
