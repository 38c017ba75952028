//! Admin directory backed by configuration.

use std::collections::HashSet;

use crate::domain::foundation::{AdminId, ChatId};
use crate::ports::AdminDirectory;

/// Fixed set of channel user ids allowed to decide orders.
#[derive(Debug, Clone)]
pub struct ConfiguredAdmins {
    user_ids: HashSet<String>,
    admin_chat: ChatId,
}

impl ConfiguredAdmins {
    pub fn new<I, S>(user_ids: I, admin_chat: ChatId) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_ids: user_ids
                .into_iter()
                .map(Into::into)
                .map(|id: String| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            admin_chat,
        }
    }

    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }
}

impl AdminDirectory for ConfiguredAdmins {
    fn authorize(&self, channel_user_id: &str) -> Option<AdminId> {
        if !self.user_ids.contains(channel_user_id) {
            return None;
        }
        AdminId::new(channel_user_id).ok()
    }

    fn admin_chat(&self) -> &ChatId {
        &self.admin_chat
    }
}
