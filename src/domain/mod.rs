//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `order` - Order aggregate and its review state machine
//! - `catalog` - Product stock
//! - `subscription` - Provisioned subscriptions
//! - `approval` - Callback tokens, approval errors, provisioning plan, notices

pub mod approval;
pub mod catalog;
pub mod foundation;
pub mod order;
pub mod subscription;
