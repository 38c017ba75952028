//! HTTP adapters - REST API implementations.

pub mod approval;

pub use approval::{approval_router, ApprovalAppState};
