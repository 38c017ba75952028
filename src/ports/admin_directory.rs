//! Admin directory port - who may decide orders and where admin notices go.

use crate::domain::foundation::{AdminId, ChatId};

pub trait AdminDirectory: Send + Sync {
    /// Returns the admin identity for a channel user, `None` if not an admin.
    fn authorize(&self, channel_user_id: &str) -> Option<AdminId>;

    /// Chat that receives review requests, confirmations and error reports.
    fn admin_chat(&self) -> &ChatId;
}
