//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the approval workflow to external systems:
//! - `postgres` - Transactional order store
//! - `telegram` - Bot API notification channel and webhook types
//! - `http` - Axum routes for the webhook and internal endpoints
//! - `admins` - Admin allow-list from configuration
//! - `access` - Access detail assignment from product instructions
//! - `memory`, `notify` - In-process doubles for tests and local runs

pub mod access;
pub mod admins;
pub mod http;
pub mod memory;
pub mod notify;
pub mod postgres;
pub mod telegram;
