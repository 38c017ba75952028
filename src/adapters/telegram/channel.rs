//! Telegram notification channel.
//!
//! Implements `NotificationChannel` over the Bot API with `reqwest`.
//!
//! # Security
//!
//! - The bot token is part of every request URL; it is held as a
//!   `secrecy::SecretString` and never logged
//! - Webhook authenticity is checked at the HTTP ingress, see
//!   `adapters::http::approval`

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::domain::approval::{MessageRef, Notice};
use crate::domain::foundation::ChatId;
use crate::ports::{ChannelError, NotificationChannel};

use super::types::{
    AnswerCallbackQueryRequest, ApiResponse, EditMessageReplyMarkupRequest, InlineKeyboardMarkup,
    SendMessageRequest, SentMessage,
};

const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Telegram client configuration.
#[derive(Clone)]
pub struct TelegramClientConfig {
    bot_token: SecretString,
    api_base_url: String,
    request_timeout: Duration,
}

impl TelegramClientConfig {
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            bot_token,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing or a local Bot API server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

pub struct TelegramChannel {
    config: TelegramClientConfig,
    http_client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(config: TelegramClientConfig) -> Result<Self, ChannelError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ChannelError::Network(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base_url,
            self.config.bot_token.expose_secret(),
            method
        )
    }

    /// Calls a Bot API method and unwraps the response envelope.
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, ChannelError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .http_client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            // reqwest errors include the URL, which carries the token
            .map_err(|e| ChannelError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            ChannelError::InvalidResponse(format!(
                "{} returned unparseable body (HTTP {}): {}",
                method,
                status,
                e.without_url()
            ))
        })?;

        unwrap_envelope(method, envelope)
    }
}

fn unwrap_envelope<T>(method: &str, envelope: ApiResponse<T>) -> Result<T, ChannelError> {
    if !envelope.ok {
        let code = envelope.error_code.unwrap_or(0);
        let description = envelope.description.unwrap_or_default();
        tracing::warn!(method, code, description = %description, "Telegram API error");
        return Err(ChannelError::Rejected { code, description });
    }
    envelope
        .result
        .ok_or_else(|| ChannelError::InvalidResponse(format!("{} returned no result", method)))
}

/// Clearing buttons twice is reported by Telegram as an error; it is not one
/// for us.
fn is_not_modified(err: &ChannelError) -> bool {
    matches!(err, ChannelError::Rejected { code: 400, description }
        if description.contains("message is not modified"))
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send(&self, chat: &ChatId, notice: &Notice) -> Result<MessageRef, ChannelError> {
        let request = SendMessageRequest::from_notice(chat, notice);
        let sent: SentMessage = self.call("sendMessage", &request).await?;
        Ok(MessageRef {
            chat_id: chat.clone(),
            message_id: sent.message_id,
        })
    }

    async fn acknowledge(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChannelError> {
        let request = AnswerCallbackQueryRequest {
            callback_query_id: callback_id,
            text,
        };
        let _: bool = self.call("answerCallbackQuery", &request).await?;
        Ok(())
    }

    async fn clear_actions(&self, message: &MessageRef) -> Result<(), ChannelError> {
        let request = EditMessageReplyMarkupRequest {
            chat_id: message.chat_id.as_str(),
            message_id: message.message_id,
            reply_markup: InlineKeyboardMarkup::empty(),
        };
        match self
            .call::<_, serde_json::Value>("editMessageReplyMarkup", &request)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if is_not_modified(&err) => Ok(()),
            Err(err) => Err(err),
        }
    }
}
