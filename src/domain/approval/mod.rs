//! Approval module - callback decoding, error taxonomy, provisioning plan
//! and the notices sent around a decision.

mod callback;
mod errors;
pub mod notices;
mod provisioning;

pub use callback::{
    CallbackAction, CallbackEvent, DecideOrderCommand, MessageRef, CALLBACK_DATA_MAX_BYTES,
};
pub use errors::ApprovalError;
pub use notices::{Notice, NoticeAction};
pub use provisioning::{ProvisioningPlan, StockChange};
