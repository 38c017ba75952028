//! In-memory adapters for tests and local runs.

mod order_store;

pub use order_store::{InMemoryOrderStore, StoreHold};
