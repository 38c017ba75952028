//! PostgreSQL adapters.
//!
//! - `PostgresOrderStore` - Orders, stock and subscriptions behind the
//!   `OrderStore` port, with row locks held for the length of a decision
//! - `connect` - Pool construction from `DatabaseConfig`

mod order_store;
mod pool;

pub use order_store::{PostgresOrderStore, PostgresTransaction};
pub use pool::{connect, run_migrations};
