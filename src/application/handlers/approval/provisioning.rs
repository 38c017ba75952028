//! ProvisioningEngine - applies an approval's stock and subscription writes
//! inside the caller's transaction.

use std::sync::Arc;

use crate::domain::approval::{ApprovalError, ProvisioningPlan};
use crate::domain::foundation::{DomainError, ErrorCode, ProductId, Timestamp};
use crate::domain::order::Order;
use crate::domain::subscription::Subscription;
use crate::ports::{AccessAssigner, OrderTransaction, StockWrite};

/// Why provisioning stopped. Either way the caller must roll back.
#[derive(Debug)]
pub enum ProvisionError {
    /// Business refusal, e.g. insufficient stock.
    Refused(ApprovalError),
    /// The store failed mid-way.
    Store(DomainError),
}

impl From<DomainError> for ProvisionError {
    fn from(err: DomainError) -> Self {
        ProvisionError::Store(err)
    }
}

impl From<ApprovalError> for ProvisionError {
    fn from(err: ApprovalError) -> Self {
        ProvisionError::Refused(err)
    }
}

/// Creates subscriptions and decrements stock for an approved order.
///
/// All-or-nothing only together with the enclosing transaction: the engine
/// checks every product before writing, but a failure after the first write
/// relies on the caller rolling back.
pub struct ProvisioningEngine {
    assigner: Arc<dyn AccessAssigner>,
}

impl ProvisioningEngine {
    pub fn new(assigner: Arc<dyn AccessAssigner>) -> Self {
        Self { assigner }
    }

    pub async fn provision(
        &self,
        tx: &mut dyn OrderTransaction,
        order: &Order,
        start: Timestamp,
    ) -> Result<Vec<Subscription>, ProvisionError> {
        let quantities = order
            .quantities_by_product()
            .map_err(|e| ApprovalError::invalid_order(order.id, e))?;
        let product_ids: Vec<ProductId> = quantities.keys().copied().collect();
        let products = tx.read_products_for_update(&product_ids).await?;

        let plan = ProvisioningPlan::build(order, &products, start, |product, item, line| {
            self.assigner.assign(product, item, order, line)
        })?;

        for change in &plan.stock_changes {
            let write = tx
                .decrement_stock(&change.product_id, change.quantity)
                .await
                .map_err(|e| refuse_invalid(order, e))?;
            match write {
                StockWrite::Applied { remaining } => {
                    tracing::debug!(
                        order_id = %order.id,
                        product_id = %change.product_id,
                        quantity = change.quantity,
                        remaining,
                        "Stock decremented"
                    );
                }
                StockWrite::Insufficient { available } => {
                    let product_name = products
                        .iter()
                        .find(|p| p.id == change.product_id)
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| change.product_id.to_string());
                    return Err(ProvisionError::Refused(ApprovalError::InsufficientStock {
                        product_id: change.product_id,
                        product_name,
                        requested: change.quantity,
                        available,
                    }));
                }
            }
        }

        tx.create_subscriptions(&plan.subscriptions)
            .await
            .map_err(|e| refuse_invalid(order, e))?;

        Ok(plan.subscriptions)
    }
}

/// A store rejecting this order's values will reject them on every retry.
fn refuse_invalid(order: &Order, err: DomainError) -> ProvisionError {
    match err.code {
        ErrorCode::ValidationFailed => {
            ProvisionError::Refused(ApprovalError::invalid_order(order.id, err.message))
        }
        _ => ProvisionError::Store(err),
    }
}
