//! Order store port - transactional access to orders, products and
//! subscriptions.
//!
//! The approval workflow never mutates order status or stock outside an
//! [`OrderTransaction`]. The transaction is the only serialization point for
//! decisions on the same order: implementations must make
//! `read_order_for_update` block (or conflict) while another open transaction
//! holds the same order, and `write_order_status` must be a compare-and-swap.
//!
//! # Example
//!
//! ```ignore
//! let mut tx = store.begin().await?;
//! let Some(order) = tx.read_order_for_update(&order_id).await? else {
//!     tx.rollback().await?;
//!     return Ok(None);
//! };
//! match tx.write_order_status(StatusChange::decide(&order, Decision::Reject, admin, Timestamp::now())).await? {
//!     StatusWrite::Applied => tx.commit().await?,
//!     StatusWrite::Conflict(current) => tx.rollback().await?,
//! }
//! ```

use async_trait::async_trait;

use crate::domain::catalog::Product;
use crate::domain::foundation::{AdminId, DomainError, OrderId, ProductId, Timestamp};
use crate::domain::order::{Decision, Order, OrderStatus};
use crate::domain::subscription::Subscription;

/// Conditional status update: only applied if the row still has `expected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub order_id: OrderId,
    pub expected: OrderStatus,
    pub new_status: OrderStatus,
    pub decided_by: AdminId,
    pub decided_at: Timestamp,
}

impl StatusChange {
    /// Status change for `decision` taken on the order as it was read.
    pub fn decide(order: &Order, decision: Decision, admin: AdminId, at: Timestamp) -> Self {
        Self {
            order_id: order.id,
            expected: order.status,
            new_status: decision.target_status(),
            decided_by: admin,
            decided_at: at,
        }
    }
}

/// Result of a compare-and-swap on order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWrite {
    Applied,
    /// Row no longer had the expected status; carries what it has now.
    Conflict(OrderStatus),
}

/// Result of a guarded stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockWrite {
    Applied { remaining: u32 },
    /// Decrement would go below zero; nothing was changed.
    Insufficient { available: u32 },
}

/// Entry point to the order store.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Opens an atomic unit of work.
    ///
    /// # Errors
    ///
    /// - `Timeout` if no connection could be acquired in time
    /// - `DatabaseError` when the store is unreachable
    async fn begin(&self) -> Result<Box<dyn OrderTransaction>, DomainError>;

    /// Reads an order outside any transaction. Not for decisions.
    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// Subscriptions provisioned for an order.
    async fn find_subscriptions_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<Subscription>, DomainError>;

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, DomainError>;
}

/// One atomic unit against the store.
///
/// Dropping a transaction without committing discards its writes. Call
/// `rollback` explicitly where the outcome matters.
#[async_trait]
pub trait OrderTransaction: Send {
    /// Reads the order and locks it for the rest of the transaction.
    async fn read_order_for_update(&mut self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// Reads and locks products. Implementations lock in id order so two
    /// approvals touching the same products cannot deadlock. Missing ids are
    /// omitted from the result.
    async fn read_products_for_update(
        &mut self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, DomainError>;

    /// Compare-and-swap on status, recording who decided and when.
    async fn write_order_status(&mut self, change: StatusChange)
        -> Result<StatusWrite, DomainError>;

    async fn create_subscriptions(&mut self, batch: &[Subscription]) -> Result<(), DomainError>;

    /// Decrements stock unless that would take it below zero.
    async fn decrement_stock(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StockWrite, DomainError>;

    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}
