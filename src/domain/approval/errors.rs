//! Error taxonomy for the approval workflow.
//!
//! Every variant is resolved inside this subsystem: the inbound callback is
//! always acknowledged, and the variant decides what the admin is told.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, ProductId};
use crate::domain::order::OrderStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    /// Callback payload could not be decoded. Never retried.
    #[error("Invalid callback: {reason}")]
    InvalidCallback { reason: String },

    /// The pressing user is not a configured administrator.
    #[error("User {user_id} is not an authorized administrator")]
    Unauthorized { user_id: String },

    #[error("Order {order_id} not found")]
    NotFound { order_id: OrderId },

    /// Another decision already won, or the order never reached review.
    #[error("Order {order_id} is already {status}")]
    AlreadyDecided {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// Approval aborted; the order stays in review until stock is fixed.
    #[error(
        "Insufficient stock for {product_name} ({product_id}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: u32,
        available: u32,
    },

    /// Order data that cannot be provisioned as stored.
    #[error("Order {order_id} cannot be provisioned: {reason}")]
    InvalidOrder { order_id: OrderId, reason: String },

    #[error("Order store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Timed out after {timeout_ms}ms waiting for the order store")]
    Timeout { timeout_ms: u64 },
}

impl ApprovalError {
    pub fn invalid_callback(reason: impl Into<String>) -> Self {
        ApprovalError::InvalidCallback {
            reason: reason.into(),
        }
    }

    pub fn invalid_order(order_id: OrderId, reason: impl ToString) -> Self {
        ApprovalError::InvalidOrder {
            order_id,
            reason: reason.to_string(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        ApprovalError::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Classifies a store failure. Lock and pool timeouts count as `Timeout`.
    pub fn from_store(err: DomainError, timeout_ms: u64) -> Self {
        match err.code {
            ErrorCode::Timeout => ApprovalError::Timeout { timeout_ms },
            _ => ApprovalError::store_unavailable(err.message),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApprovalError::InvalidCallback { .. } => ErrorCode::ValidationFailed,
            ApprovalError::Unauthorized { .. } => ErrorCode::Unauthorized,
            ApprovalError::NotFound { .. } => ErrorCode::OrderNotFound,
            ApprovalError::AlreadyDecided { .. } => ErrorCode::InvalidStateTransition,
            ApprovalError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            ApprovalError::InvalidOrder { .. } => ErrorCode::ValidationFailed,
            ApprovalError::StoreUnavailable { .. } => ErrorCode::DatabaseError,
            ApprovalError::Timeout { .. } => ErrorCode::Timeout,
        }
    }

    /// Transient failures the admin can retry as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApprovalError::StoreUnavailable { .. } | ApprovalError::Timeout { .. }
        )
    }

    /// Whether the admin chat gets a separate error report after the ack.
    pub fn needs_admin_report(&self) -> bool {
        matches!(
            self,
            ApprovalError::InsufficientStock { .. }
                | ApprovalError::InvalidOrder { .. }
                | ApprovalError::StoreUnavailable { .. }
                | ApprovalError::Timeout { .. }
        )
    }

    /// Short text shown on the admin's button press acknowledgement.
    pub fn acknowledgement_text(&self) -> &'static str {
        match self {
            ApprovalError::InvalidCallback { .. } => "Invalid action",
            ApprovalError::Unauthorized { .. } => "You are not authorized to review orders",
            ApprovalError::NotFound { .. } => "Order not found",
            ApprovalError::AlreadyDecided { .. } => "Order already processed",
            ApprovalError::InsufficientStock { .. } => "Insufficient stock, order left in review",
            ApprovalError::InvalidOrder { .. } => "Order cannot be provisioned",
            ApprovalError::StoreUnavailable { .. } | ApprovalError::Timeout { .. } => {
                "Temporary failure, please retry"
            }
        }
    }
}

impl From<ApprovalError> for DomainError {
    fn from(err: ApprovalError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
