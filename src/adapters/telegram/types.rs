//! Telegram Bot API wire types.
//!
//! Only the fields this service reads or writes are modelled; unknown fields
//! are ignored on deserialization.

use serde::{Deserialize, Serialize};

use crate::domain::approval::{CallbackEvent, MessageRef, Notice};
use crate::domain::foundation::ChatId;

// ════════════════════════════════════════════════════════════════════════════════
// Inbound
// ════════════════════════════════════════════════════════════════════════════════

/// Webhook update. Anything but a callback query is ignored by this service.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

impl TelegramMessage {
    pub fn to_message_ref(&self) -> Option<MessageRef> {
        Some(MessageRef {
            chat_id: ChatId::new(self.chat.id.to_string()).ok()?,
            message_id: self.message_id,
        })
    }
}

impl CallbackQuery {
    /// Normalizes into the channel-independent event. A missing `data` field
    /// becomes an empty payload, which the dispatcher rejects as invalid.
    pub fn into_event(self) -> CallbackEvent {
        CallbackEvent {
            message: self.message.as_ref().and_then(TelegramMessage::to_message_ref),
            callback_id: self.id,
            data: self.data.unwrap_or_default(),
            from_user_id: self.from.id.to_string(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Outbound
// ════════════════════════════════════════════════════════════════════════════════

/// Bot API message text limit, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    pub fn empty() -> Self {
        Self {
            inline_keyboard: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: &'a str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl<'a> SendMessageRequest<'a> {
    /// Builds the request, putting all buttons on one row.
    pub fn from_notice(chat: &'a ChatId, notice: &Notice) -> Self {
        let reply_markup = if notice.actions.is_empty() {
            None
        } else {
            Some(InlineKeyboardMarkup {
                inline_keyboard: vec![notice
                    .actions
                    .iter()
                    .map(|a| InlineKeyboardButton {
                        text: a.label.clone(),
                        callback_data: a.data.clone(),
                    })
                    .collect()],
            })
        };
        Self {
            chat_id: chat.as_str(),
            text: truncate_text(&notice.text, MAX_MESSAGE_CHARS),
            reply_markup,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackQueryRequest<'a> {
    pub callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageReplyMarkupRequest<'a> {
    pub chat_id: &'a str,
    pub message_id: i64,
    pub reply_markup: InlineKeyboardMarkup,
}

/// Envelope every Bot API method responds with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Sent message as returned by `sendMessage`.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_update_becomes_event() {
        let json = r#"{
            "update_id": 10,
            "callback_query": {
                "id": "4382bfdwdsb323b2d9",
                "from": {"id": 1001, "is_bot": false, "first_name": "Ana"},
                "message": {"message_id": 55, "chat": {"id": -100200, "type": "group"}, "date": 0},
                "chat_instance": "x",
                "data": "reject:0b8f8c52-2c83-4d38-9a55-59a0b3a6a8f1"
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        let event = update.callback_query.unwrap().into_event();

        assert_eq!(event.callback_id, "4382bfdwdsb323b2d9");
        assert_eq!(event.from_user_id, "1001");
        assert_eq!(event.data, "reject:0b8f8c52-2c83-4d38-9a55-59a0b3a6a8f1");
        let message = event.message.unwrap();
        assert_eq!(message.chat_id.as_str(), "-100200");
        assert_eq!(message.message_id, 55);
    }

    #[test]
    fn non_callback_update_has_no_query() {
        let json = r#"{"update_id": 11, "message": {"message_id": 1, "chat": {"id": 5}, "text": "hi"}}"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert!(update.callback_query.is_none());
    }

    #[test]
    fn send_request_puts_buttons_on_one_row() {
        let chat = ChatId::new("-100200").unwrap();
        let notice = Notice::text("Review")
            .with_action("Approve", "approve:x")
            .with_action("Reject", "reject:x");

        let body = serde_json::to_value(SendMessageRequest::from_notice(&chat, &notice)).unwrap();

        assert_eq!(body["chat_id"], "-100200");
        assert_eq!(body["reply_markup"]["inline_keyboard"][0][1]["callback_data"], "reject:x");
    }

    #[test]
    fn plain_notice_has_no_markup() {
        let chat = ChatId::new("1").unwrap();
        let body = serde_json::to_value(SendMessageRequest::from_notice(&chat, &Notice::text("hi"))).unwrap();
        assert!(body.get("reply_markup").is_none());
    }

    #[test]
    fn long_text_is_truncated_on_char_boundary() {
        let text = "é".repeat(MAX_MESSAGE_CHARS + 10);
        let truncated = truncate_text(&text, MAX_MESSAGE_CHARS);
        assert_eq!(truncated.chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn error_response_parses() {
        let json = r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#;
        let response: ApiResponse<SentMessage> = serde_json::from_str(json).unwrap();
        assert!(!response.ok);
        assert_eq!(response.error_code, Some(400));
        assert!(response.result.is_none());
    }

    /// Envelopes parse for any deserializable result, as the client needs.
    fn envelope<T: serde::de::DeserializeOwned>(json: &str) -> ApiResponse<T> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn envelope_parses_without_result_for_any_payload() {
        let sent: ApiResponse<SentMessage> = envelope(r#"{"ok": true, "result": {"message_id": 3}}"#);
        assert_eq!(sent.result.map(|m| m.message_id), Some(3));

        let missing: ApiResponse<SentMessage> = envelope(r#"{"ok": false}"#);
        assert!(missing.result.is_none());

        let flag: ApiResponse<bool> = envelope(r#"{"ok": true, "result": true}"#);
        assert_eq!(flag.result, Some(true));
    }
}
