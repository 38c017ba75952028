//! Callback tokens carried on the admin's inline buttons.
//!
//! The token format `approve:<order uuid>` / `reject:<order uuid>` is shared
//! with whatever sends the review request, so it must stay stable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::foundation::{AdminId, ChatId, OrderId};
use crate::domain::order::Decision;

use super::ApprovalError;

/// Upper bound the messaging transport puts on button payloads.
pub const CALLBACK_DATA_MAX_BYTES: usize = 64;

/// Decoded button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackAction {
    pub decision: Decision,
    pub order_id: OrderId,
}

impl CallbackAction {
    pub fn new(decision: Decision, order_id: OrderId) -> Self {
        Self { decision, order_id }
    }

    pub fn approve(order_id: OrderId) -> Self {
        Self::new(Decision::Approve, order_id)
    }

    pub fn reject(order_id: OrderId) -> Self {
        Self::new(Decision::Reject, order_id)
    }

    /// Decodes callback data. Anything but `approve:<uuid>` or
    /// `reject:<uuid>` is `InvalidCallback`.
    pub fn parse(data: &str) -> Result<Self, ApprovalError> {
        if data.len() > CALLBACK_DATA_MAX_BYTES {
            return Err(ApprovalError::invalid_callback(format!(
                "payload is {} bytes, limit is {}",
                data.len(),
                CALLBACK_DATA_MAX_BYTES
            )));
        }

        let (action, id) = data
            .split_once(':')
            .ok_or_else(|| ApprovalError::invalid_callback("missing ':' separator"))?;

        let decision = match action {
            "approve" => Decision::Approve,
            "reject" => Decision::Reject,
            other => {
                return Err(ApprovalError::invalid_callback(format!(
                    "unknown action '{}'",
                    other
                )))
            }
        };

        // Only the canonical hyphenated form is produced by `encode`.
        if id.len() != 36 {
            return Err(ApprovalError::invalid_callback(format!(
                "order id '{}' is not a hyphenated uuid",
                id
            )));
        }
        let uuid = Uuid::parse_str(id).map_err(|e| {
            ApprovalError::invalid_callback(format!("order id '{}' is not a uuid: {}", id, e))
        })?;

        Ok(Self::new(decision, OrderId::from_uuid(uuid)))
    }

    pub fn encode(&self) -> String {
        format!("{}:{}", self.decision.as_str(), self.order_id.as_uuid().hyphenated())
    }
}

impl FromStr for CallbackAction {
    type Err = ApprovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// A message previously delivered through the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i64,
}

/// Raw button press as received from the channel. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    /// Channel-assigned id used to acknowledge the press.
    pub callback_id: String,

    /// Button payload, expected to be a [`CallbackAction`] token.
    pub data: String,

    /// Channel identity of whoever pressed the button.
    pub from_user_id: String,

    /// The admin message the button was attached to, when known.
    pub message: Option<MessageRef>,
}

/// Normalized input to the approval workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecideOrderCommand {
    pub order_id: OrderId,
    pub decision: Decision,
    pub admin: AdminId,
}

impl DecideOrderCommand {
    pub fn new(order_id: OrderId, decision: Decision, admin: AdminId) -> Self {
        Self {
            order_id,
            decision,
            admin,
        }
    }

    pub fn from_action(action: CallbackAction, admin: AdminId) -> Self {
        Self::new(action.order_id, action.decision, admin)
    }
}
