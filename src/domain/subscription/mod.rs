//! Subscription module.

mod entity;

pub use entity::{AccessDetails, Subscription};
