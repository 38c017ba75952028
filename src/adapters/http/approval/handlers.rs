//! HTTP handlers for the approval endpoints.
//!
//! The Telegram webhook answers 200 for anything it accepted, including
//! updates it ignores and payloads it cannot parse, so Telegram does not keep
//! redelivering them. Only a bad secret token is refused.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::adapters::telegram::Update;
use crate::application::{CallbackDispatcher, RequestReviewCommand, RequestReviewError, RequestReviewHandler};
use crate::domain::foundation::OrderId;

use super::dto::{ErrorResponse, HealthResponse, ReviewRequestResponse};

/// Header Telegram sets to the secret registered with `setWebhook`.
pub const TELEGRAM_SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Header carrying the token for internal endpoints.
pub const INTERNAL_TOKEN_HEADER: &str = "X-Internal-Token";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ApprovalAppState {
    pub dispatcher: Arc<CallbackDispatcher>,
    pub review_requests: Arc<RequestReviewHandler>,
    /// When set, webhook calls must carry it in [`TELEGRAM_SECRET_HEADER`].
    pub webhook_secret: Option<SecretString>,
    /// When unset, internal endpoints are disabled.
    pub internal_token: Option<SecretString>,
}

/// Compares a provided header value with the expected secret in constant
/// time. Both sides are hashed first so lengths never leak.
pub fn secret_matches(expected: &SecretString, provided: Option<&str>) -> bool {
    let Some(provided) = provided else {
        return false;
    };
    let expected = Sha256::digest(expected.expose_secret().as_bytes());
    let provided = Sha256::digest(provided.as_bytes());
    expected.as_slice().ct_eq(provided.as_slice()).unwrap_u8() == 1
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn telegram_webhook(
    State(state): State<ApprovalAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApprovalApiError> {
    if let Some(secret) = &state.webhook_secret {
        if !secret_matches(secret, header(&headers, TELEGRAM_SECRET_HEADER)) {
            tracing::warn!("Telegram webhook with invalid secret token");
            return Err(ApprovalApiError::Unauthorized);
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!(error = %e, "Unparseable Telegram update dropped");
            return Ok(StatusCode::OK);
        }
    };

    let Some(query) = update.callback_query else {
        tracing::debug!(update_id = update.update_id, "Ignoring non-callback update");
        return Ok(StatusCode::OK);
    };

    let outcome = state.dispatcher.dispatch(query.into_event()).await;
    if let Some(err) = outcome.error() {
        tracing::debug!(update_id = update.update_id, code = %err.code(), "Callback handled with error");
    }

    Ok(StatusCode::OK)
}

pub async fn request_review(
    State(state): State<ApprovalAppState>,
    Path(order_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ReviewRequestResponse>, ApprovalApiError> {
    let Some(token) = &state.internal_token else {
        return Err(ApprovalApiError::Disabled);
    };
    if !secret_matches(token, header(&headers, INTERNAL_TOKEN_HEADER)) {
        return Err(ApprovalApiError::Unauthorized);
    }

    let order_id = OrderId::from_uuid(order_id);
    let message = state
        .review_requests
        .handle(RequestReviewCommand { order_id })
        .await?;

    Ok(Json(ReviewRequestResponse {
        order_id: order_id.to_string(),
        chat_id: message.chat_id.to_string(),
        message_id: message.message_id,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts handler errors to HTTP responses.
#[derive(Debug)]
pub enum ApprovalApiError {
    Unauthorized,
    Disabled,
    ReviewRequest(RequestReviewError),
}

impl From<RequestReviewError> for ApprovalApiError {
    fn from(err: RequestReviewError) -> Self {
        Self::ReviewRequest(err)
    }
}

impl IntoResponse for ApprovalApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message) = match &self {
            ApprovalApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Missing or invalid token".to_string(),
            ),
            ApprovalApiError::Disabled => (
                StatusCode::FORBIDDEN,
                "DISABLED",
                "Internal endpoints are not enabled".to_string(),
            ),
            ApprovalApiError::ReviewRequest(err) => match err {
                RequestReviewError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND", err.to_string())
                }
                RequestReviewError::NotAwaitingReview { .. } => {
                    (StatusCode::CONFLICT, "NOT_AWAITING_REVIEW", err.to_string())
                }
                RequestReviewError::Store(_) => {
                    tracing::error!(error = %err, "Review request failed");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "STORE_UNAVAILABLE",
                        "Order store unavailable".to_string(),
                    )
                }
                RequestReviewError::Delivery(_) => {
                    tracing::warn!(error = %err, "Review request not delivered");
                    (StatusCode::BAD_GATEWAY, "DELIVERY_FAILED", err.to_string())
                }
            },
        };

        (status, Json(ErrorResponse::new(error_code, message))).into_response()
    }
}
