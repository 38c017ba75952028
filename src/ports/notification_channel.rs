//! Notification channel port - the bot-style messaging transport.
//!
//! Delivery to chats and acknowledgement of button presses. The channel may
//! redeliver presses; nothing here relies on it deduplicating them.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::approval::{MessageRef, Notice};
use crate::domain::foundation::ChatId;

/// Failure talking to the messaging transport.
///
/// Delivery failures are logged by callers and never affect committed state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Channel rejected request ({code}): {description}")]
    Rejected { code: i64, description: String },

    #[error("Invalid response from channel: {0}")]
    InvalidResponse(String),
}

impl ChannelError {
    /// Network hiccups and rate limits may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChannelError::Network(_) => true,
            ChannelError::Rejected { code, .. } => *code == 429 || *code >= 500,
            ChannelError::InvalidResponse(_) => false,
        }
    }
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Delivers a notice to a chat and returns a reference to the sent message.
    async fn send(&self, chat: &ChatId, notice: &Notice) -> Result<MessageRef, ChannelError>;

    /// Acknowledges a button press, optionally showing `text` to the presser.
    async fn acknowledge(&self, callback_id: &str, text: Option<&str>)
        -> Result<(), ChannelError>;

    /// Removes the buttons from a previously sent message.
    async fn clear_actions(&self, message: &MessageRef) -> Result<(), ChannelError>;
}
