//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `OrderStore` / `OrderTransaction` - Transactional order, stock and
//!   subscription persistence
//! - `NotificationChannel` - Messaging transport for admins and customers
//! - `AccessAssigner` - Account-access details for provisioned subscriptions
//! - `AdminDirectory` - Authorized administrators and the admin chat

mod access_assigner;
mod admin_directory;
mod notification_channel;
mod order_store;

pub use access_assigner::AccessAssigner;
pub use admin_directory::AdminDirectory;
pub use notification_channel::{ChannelError, NotificationChannel};
pub use order_store::{OrderStore, OrderTransaction, StatusChange, StatusWrite, StockWrite};
