//! Telegram Bot API configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Telegram configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather (`<bot id>:<secret>`)
    pub bot_token: SecretString,

    /// Bot API base URL; point at a local Bot API server if needed
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Secret registered with `setWebhook`, echoed by Telegram on every call
    pub webhook_secret: Option<SecretString>,

    /// Chat that receives review requests and error reports
    pub admin_chat_id: String,

    /// Bot API request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl TelegramConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate Telegram configuration
    ///
    /// Production deployments must set a webhook secret.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let token = self.bot_token.expose_secret();
        if token.is_empty() {
            return Err(ValidationError::MissingRequired("STOREFRONT__TELEGRAM__BOT_TOKEN"));
        }
        match token.split_once(':') {
            Some((id, secret))
                if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) && !secret.is_empty() => {}
            _ => return Err(ValidationError::InvalidBotToken),
        }

        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidApiBaseUrl);
        }

        if self.admin_chat_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("STOREFRONT__TELEGRAM__ADMIN_CHAT_ID"));
        }

        match &self.webhook_secret {
            Some(secret) if !is_valid_webhook_secret(secret.expose_secret()) => {
                return Err(ValidationError::InvalidWebhookSecret);
            }
            None if *environment == Environment::Production => {
                return Err(ValidationError::WebhookSecretRequired);
            }
            _ => {}
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

/// Telegram accepts 1-256 characters from `A-Z a-z 0-9 _ -`.
fn is_valid_webhook_secret(secret: &str) -> bool {
    (1..=256).contains(&secret.len())
        && secret
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_request_timeout() -> u64 {
    10
}
