//! Telegram Bot API adapter.
//!
//! - `channel` - `NotificationChannel` over the Bot API
//! - `types` - Update and request/response wire types

mod channel;
mod types;

pub use channel::{TelegramChannel, TelegramClientConfig};
pub use types::{CallbackQuery, Update};
