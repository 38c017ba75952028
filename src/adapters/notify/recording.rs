//! Recording notification channel for testing.
//!
//! Captures every call for assertions and can be told to fail sends or
//! acknowledgements to exercise delivery-failure paths.
//!
//! # Panics
//!
//! Methods panic if the internal lock is poisoned. Test use only.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::domain::approval::{MessageRef, Notice};
use crate::domain::foundation::ChatId;
use crate::ports::{ChannelError, NotificationChannel};

/// One recorded call on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCall {
    Send { chat: ChatId, notice: Notice },
    Acknowledge { callback_id: String, text: Option<String> },
    ClearActions { message: MessageRef },
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<ChannelCall>,
    next_message_id: i64,
    fail_sends: bool,
    fail_acknowledgements: bool,
}

#[derive(Clone, Default)]
pub struct RecordingChannel {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut RecordingState) -> R) -> R {
        let mut state = self
            .state
            .lock()
            .expect("RecordingChannel: state lock poisoned");
        f(&mut state)
    }

    /// Makes `send` fail (the call is still recorded).
    pub fn fail_sends(&self, fail: bool) {
        self.with_state(|s| s.fail_sends = fail);
    }

    /// Makes `acknowledge` fail (the call is still recorded).
    pub fn fail_acknowledgements(&self, fail: bool) {
        self.with_state(|s| s.fail_acknowledgements = fail);
    }

    pub fn calls(&self) -> Vec<ChannelCall> {
        self.with_state(|s| s.calls.clone())
    }

    /// Notices sent to `chat`, in order.
    pub fn sent_to(&self, chat: &ChatId) -> Vec<Notice> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::Send { chat: c, notice } if &c == chat => Some(notice),
                _ => None,
            })
            .collect()
    }

    /// `(callback_id, text)` for every acknowledgement.
    pub fn acknowledgements(&self) -> Vec<(String, Option<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::Acknowledge { callback_id, text } => Some((callback_id, text)),
                _ => None,
            })
            .collect()
    }

    pub fn cleared(&self) -> Vec<MessageRef> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::ClearActions { message } => Some(message),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, chat: &ChatId, notice: &Notice) -> Result<MessageRef, ChannelError> {
        self.with_state(|s| {
            s.calls.push(ChannelCall::Send {
                chat: chat.clone(),
                notice: notice.clone(),
            });
            if s.fail_sends {
                return Err(ChannelError::Network("simulated send failure".to_string()));
            }
            s.next_message_id += 1;
            Ok(MessageRef {
                chat_id: chat.clone(),
                message_id: s.next_message_id,
            })
        })
    }

    async fn acknowledge(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChannelError> {
        self.with_state(|s| {
            s.calls.push(ChannelCall::Acknowledge {
                callback_id: callback_id.to_string(),
                text: text.map(str::to_string),
            });
            if s.fail_acknowledgements {
                return Err(ChannelError::Network("simulated ack failure".to_string()));
            }
            Ok(())
        })
    }

    async fn clear_actions(&self, message: &MessageRef) -> Result<(), ChannelError> {
        self.with_state(|s| {
            s.calls.push(ChannelCall::ClearActions {
                message: message.clone(),
            });
            Ok(())
        })
    }
}
