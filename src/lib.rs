//! Storefront Approvals - Order approval and subscription provisioning
//!
//! Admins approve or reject paid orders from Telegram inline buttons. An
//! approval atomically takes stock, records the decision and provisions one
//! subscription per order line; a rejection only records the decision.
//! Customers and admins are notified after the transaction commits.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
