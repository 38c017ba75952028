//! Approval workflow configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Approval workflow configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalConfig {
    /// Telegram user ids allowed to approve or reject (comma-separated)
    pub admin_user_ids: String,

    /// Upper bound on waiting for the order lock, in milliseconds
    #[serde(default = "default_transaction_timeout")]
    pub transaction_timeout_ms: u64,

    /// Whether pressing a button on an already decided order shows a toast
    #[serde(default = "default_notify_already_decided")]
    pub notify_admin_on_already_decided: bool,
}

impl ApprovalConfig {
    /// Admin ids as a list, blanks dropped
    pub fn admin_ids(&self) -> Vec<String> {
        self.admin_user_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }

    /// Validate approval configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.admin_ids().is_empty() {
            return Err(ValidationError::NoAdminsConfigured);
        }
        if self.transaction_timeout_ms == 0 || self.transaction_timeout_ms > 60_000 {
            return Err(ValidationError::InvalidTransactionTimeout);
        }
        Ok(())
    }
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            admin_user_ids: String::new(),
            transaction_timeout_ms: default_transaction_timeout(),
            notify_admin_on_already_decided: default_notify_already_decided(),
        }
    }
}

fn default_transaction_timeout() -> u64 {
    5000
}

fn default_notify_already_decided() -> bool {
    true
}
