//! In-memory order store.
//!
//! A transaction holds the store-wide lock from `begin` until commit or
//! rollback and works on a staged copy, so concurrent decisions serialize
//! exactly like row locks would and an aborted transaction leaves no trace.
//! Coarser than row locking, which is fine for tests and local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::catalog::Product;
use crate::domain::foundation::{DomainError, ErrorCode, OrderId, ProductId};
use crate::domain::order::Order;
use crate::domain::subscription::Subscription;
use crate::ports::{OrderStore, OrderTransaction, StatusChange, StatusWrite, StockWrite};

#[derive(Debug, Clone, Default)]
struct StoreState {
    orders: HashMap<OrderId, Order>,
    products: HashMap<ProductId, Product>,
    subscriptions: Vec<Subscription>,
}

/// Keeps the store locked while alive. See [`InMemoryOrderStore::hold`].
pub struct StoreHold {
    _guard: OwnedMutexGuard<StoreState>,
}

#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<Mutex<StoreState>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::database("in-memory store marked unavailable"));
        }
        Ok(())
    }

    // === Seeding and inspection ===

    pub async fn insert_order(&self, order: Order) {
        self.state.lock().await.orders.insert(order.id, order);
    }

    pub async fn insert_product(&self, product: Product) {
        self.state.lock().await.products.insert(product.id, product);
    }

    pub async fn order(&self, id: &OrderId) -> Option<Order> {
        self.state.lock().await.orders.get(id).cloned()
    }

    pub async fn stock(&self, id: &ProductId) -> Option<u32> {
        self.state.lock().await.products.get(id).map(|p| p.stock)
    }

    pub async fn subscriptions_for(&self, order_id: &OrderId) -> Vec<Subscription> {
        self.state
            .lock()
            .await
            .subscriptions
            .iter()
            .filter(|s| &s.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Makes every following call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Takes the store lock without a transaction, blocking `begin` until the
    /// returned hold is dropped.
    pub async fn hold(&self) -> StoreHold {
        StoreHold {
            _guard: self.state.clone().lock_owned().await,
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn begin(&self) -> Result<Box<dyn OrderTransaction>, DomainError> {
        self.check_available()?;
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTransaction {
            guard,
            staged,
            unavailable: self.unavailable.clone(),
        }))
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        self.check_available()?;
        Ok(self.order(id).await)
    }

    async fn find_subscriptions_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<Subscription>, DomainError> {
        self.check_available()?;
        Ok(self.subscriptions_for(order_id).await)
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, DomainError> {
        self.check_available()?;
        Ok(self.state.lock().await.products.get(id).cloned())
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    staged: StoreState,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryTransaction {
    fn check_available(&self) -> Result<(), DomainError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::database("in-memory store marked unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderTransaction for InMemoryTransaction {
    async fn read_order_for_update(&mut self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        self.check_available()?;
        Ok(self.staged.orders.get(id).cloned())
    }

    async fn read_products_for_update(
        &mut self,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, DomainError> {
        self.check_available()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.staged.products.get(id).cloned())
            .collect())
    }

    async fn write_order_status(
        &mut self,
        change: StatusChange,
    ) -> Result<StatusWrite, DomainError> {
        self.check_available()?;
        let Some(order) = self.staged.orders.get_mut(&change.order_id) else {
            return Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", change.order_id),
            ));
        };
        if order.status != change.expected {
            return Ok(StatusWrite::Conflict(order.status));
        }
        order.status = change.new_status;
        order.decided_by = Some(change.decided_by);
        order.decided_at = Some(change.decided_at);
        order.updated_at = change.decided_at;
        Ok(StatusWrite::Applied)
    }

    async fn create_subscriptions(&mut self, batch: &[Subscription]) -> Result<(), DomainError> {
        self.check_available()?;
        self.staged.subscriptions.extend_from_slice(batch);
        Ok(())
    }

    async fn decrement_stock(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StockWrite, DomainError> {
        self.check_available()?;
        let Some(product) = self.staged.products.get_mut(product_id) else {
            return Ok(StockWrite::Insufficient { available: 0 });
        };
        if !product.has_stock_for(quantity) {
            return Ok(StockWrite::Insufficient {
                available: product.stock,
            });
        }
        let remaining = product.decrement(quantity)?;
        Ok(StockWrite::Applied { remaining })
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.check_available()?;
        let InMemoryTransaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{AdminId, Timestamp};
    use crate::domain::order::test_support::{item, order_with};
    use crate::domain::order::{Decision, OrderStatus};
    use std::time::Duration;

    async fn seeded() -> (InMemoryOrderStore, Order, Product) {
        let store = InMemoryOrderStore::new();
        let product = Product::new(ProductId::new(), "Streaming", 3);
        let order = order_with(vec![item(product.id, 1, 1)]);
        store.insert_product(product.clone()).await;
        store.insert_order(order.clone()).await;
        (store, order, product)
    }

    #[tokio::test]
    async fn uncommitted_writes_are_discarded() {
        let (store, order, product) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        tx.decrement_stock(&product.id, 2).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.stock(&product.id).await, Some(3));
        assert_eq!(store.order(&order.id).await.unwrap().status, OrderStatus::PendingReview);
    }

    #[tokio::test]
    async fn dropped_transaction_releases_lock_without_writing() {
        let (store, _order, product) = seeded().await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.decrement_stock(&product.id, 1).await.unwrap();
        }

        assert_eq!(store.stock(&product.id).await, Some(3));
    }

    #[tokio::test]
    async fn status_write_is_compare_and_swap() {
        let (store, order, _product) = seeded().await;
        let admin = AdminId::new("1").unwrap();

        let mut tx = store.begin().await.unwrap();
        let change = StatusChange::decide(&order, Decision::Approve, admin.clone(), Timestamp::now());
        assert_eq!(tx.write_order_status(change).await.unwrap(), StatusWrite::Applied);
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let stale = StatusChange::decide(&order, Decision::Reject, admin, Timestamp::now());
        assert_eq!(
            tx.write_order_status(stale).await.unwrap(),
            StatusWrite::Conflict(OrderStatus::Completed)
        );
    }

    #[tokio::test]
    async fn decrement_refuses_to_go_negative() {
        let (store, _order, product) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        assert_eq!(
            tx.decrement_stock(&product.id, 4).await.unwrap(),
            StockWrite::Insufficient { available: 3 }
        );
        assert_eq!(
            tx.decrement_stock(&product.id, 3).await.unwrap(),
            StockWrite::Applied { remaining: 0 }
        );
    }

    #[tokio::test]
    async fn second_transaction_waits_for_first() {
        let (store, _order, _product) = seeded().await;

        let first = store.begin().await.unwrap();
        let waiting = tokio::time::timeout(Duration::from_millis(30), store.begin()).await;
        assert!(waiting.is_err());

        first.rollback().await.unwrap();
        assert!(store.begin().await.is_ok());
    }

    #[tokio::test]
    async fn unavailable_store_fails_begin() {
        let (store, _order, _product) = seeded().await;
        store.set_unavailable(true);
        assert!(store.begin().await.is_err());
    }
}
