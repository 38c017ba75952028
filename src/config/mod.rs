//! Process configuration.
//!
//! Everything comes from `STOREFRONT__<SECTION>__<KEY>` environment
//! variables, with an optional `.env` file for local runs:
//!
//! ```text
//! STOREFRONT__DATABASE__URL=postgres://app@localhost/storefront
//! STOREFRONT__TELEGRAM__BOT_TOKEN=123456:ABC-def
//! STOREFRONT__TELEGRAM__ADMIN_CHAT_ID=-100200300
//! STOREFRONT__APPROVAL__ADMIN_USER_IDS=1001,1002
//! ```
//!
//! Loading only checks shape. Call [`AppConfig::validate`] before wiring
//! anything up.

mod approval;
mod database;
mod error;
mod server;
mod telegram;

pub use approval::ApprovalConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use telegram::TelegramConfig;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
    pub approval: ApprovalConfig,
}

impl AppConfig {
    /// Reads `.env` if present, then the process environment.
    ///
    /// Fails when a section without defaults is absent or a value does not
    /// parse into its field type.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(error = %err, ".env present but unreadable");
            }
        }

        let source = config::Environment::default()
            .prefix("STOREFRONT")
            .separator("__");

        Ok(config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?)
    }

    /// Checks each section; the Telegram rules depend on the environment.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.telegram.validate(&self.server.environment)?;
        self.approval.validate()
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
