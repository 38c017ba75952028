//! Provisioning plan for an approved order.
//!
//! The plan is computed from locked product rows before anything is written:
//! every product is checked first, and only a plan that covers the whole order
//! is handed back for the transaction to apply.

use std::collections::HashMap;

use crate::domain::catalog::Product;
use crate::domain::foundation::{ProductId, Timestamp};
use crate::domain::order::{Order, OrderItem};
use crate::domain::subscription::{AccessDetails, Subscription};

use super::ApprovalError;

/// Stock to remove from one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Everything approval writes besides the status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningPlan {
    pub stock_changes: Vec<StockChange>,
    pub subscriptions: Vec<Subscription>,
}

impl ProvisioningPlan {
    /// Builds the plan or fails without side effects.
    ///
    /// `assign` yields access details for one order line; it is only called
    /// once every product is known to have enough stock. Quantities for the
    /// same product across lines are summed before checking.
    pub fn build<F>(
        order: &Order,
        products: &[Product],
        start: Timestamp,
        mut assign: F,
    ) -> Result<Self, ApprovalError>
    where
        F: FnMut(&Product, &OrderItem, usize) -> AccessDetails,
    {
        let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();

        let quantities = order
            .quantities_by_product()
            .map_err(|e| ApprovalError::invalid_order(order.id, e))?;

        let mut stock_changes = Vec::new();
        for (product_id, requested) in quantities {
            let available = by_id.get(&product_id).map(|p| p.stock).unwrap_or(0);
            if available < requested {
                return Err(ApprovalError::InsufficientStock {
                    product_id,
                    product_name: product_name(order, &by_id, product_id),
                    requested,
                    available,
                });
            }
            stock_changes.push(StockChange {
                product_id,
                quantity: requested,
            });
        }

        let mut subscriptions = Vec::with_capacity(order.items.len());
        for (line, item) in order.items.iter().enumerate() {
            // Presence was established by the stock check above.
            let Some(product) = by_id.get(&item.product_id) else {
                continue;
            };
            let access = assign(product, item, line);
            let subscription = Subscription::provision(
                order.user_id.clone(),
                item.product_id,
                order.id,
                item.duration,
                access,
                start,
            )
            .map_err(|e| ApprovalError::invalid_order(order.id, e))?;
            subscriptions.push(subscription);
        }

        Ok(Self {
            stock_changes,
            subscriptions,
        })
    }
}

fn product_name(order: &Order, by_id: &HashMap<ProductId, &Product>, id: ProductId) -> String {
    by_id
        .get(&id)
        .map(|p| p.name.clone())
        .or_else(|| {
            order
                .items
                .iter()
                .find(|i| i.product_id == id)
                .map(|i| i.product_name.clone())
        })
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::test_support::{item, order_with};
    use chrono::{TimeZone, Utc};

    fn access(product: &Product, _item: &OrderItem, line: usize) -> AccessDetails {
        AccessDetails::new(format!("{}#{}", product.name, line))
    }

    #[test]
    fn plan_covers_every_line() {
        let p = Product::new(ProductId::new(), "Streaming", 3);
        let q = Product::new(ProductId::new(), "AI Tool", 1);
        let order = order_with(vec![item(p.id, 1, 1), item(q.id, 1, 6)]);

        let plan = ProvisioningPlan::build(&order, &[p.clone(), q.clone()], Timestamp::now(), access)
            .unwrap();

        assert_eq!(plan.subscriptions.len(), 2);
        assert_eq!(plan.stock_changes.len(), 2);
        assert!(plan
            .stock_changes
            .contains(&StockChange { product_id: p.id, quantity: 1 }));
        assert_eq!(plan.subscriptions[1].access_details.as_str(), "AI Tool#1");
        assert!(plan.subscriptions.iter().all(|s| s.is_active && s.order_id == order.id));
    }

    #[test]
    fn one_short_product_fails_whole_plan() {
        let p = Product::new(ProductId::new(), "Streaming", 5);
        let q = Product::new(ProductId::new(), "AI Tool", 0);
        let order = order_with(vec![item(p.id, 1, 1), item(q.id, 1, 1)]);
        let mut assigned = 0;

        let err = ProvisioningPlan::build(&order, &[p, q.clone()], Timestamp::now(), |p, i, l| {
            assigned += 1;
            access(p, i, l)
        })
        .unwrap_err();

        assert_eq!(
            err,
            ApprovalError::InsufficientStock {
                product_id: q.id,
                product_name: "AI Tool".into(),
                requested: 1,
                available: 0,
            }
        );
        assert_eq!(assigned, 0);
    }

    #[test]
    fn repeated_product_lines_share_stock() {
        let p = Product::new(ProductId::new(), "Streaming", 2);
        let order = order_with(vec![item(p.id, 1, 1), item(p.id, 2, 3)]);

        let err = ProvisioningPlan::build(&order, &[p], Timestamp::now(), access).unwrap_err();

        assert!(matches!(
            err,
            ApprovalError::InsufficientStock { requested: 3, available: 2, .. }
        ));
    }

    #[test]
    fn missing_product_counts_as_no_stock() {
        let order = order_with(vec![item(ProductId::new(), 1, 1)]);

        let err = ProvisioningPlan::build(&order, &[], Timestamp::now(), access).unwrap_err();

        assert!(matches!(
            err,
            ApprovalError::InsufficientStock { available: 0, ref product_name, .. } if product_name == "Streaming Premium"
        ));
    }

    #[test]
    fn subscriptions_use_calendar_months_from_start() {
        let p = Product::new(ProductId::new(), "Streaming", 1);
        let order = order_with(vec![item(p.id, 1, 1)]);
        let start = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap());

        let plan = ProvisioningPlan::build(&order, &[p], start, access).unwrap();

        let expected =
            Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap());
        assert_eq!(plan.subscriptions[0].start_date, start);
        assert_eq!(plan.subscriptions[0].end_date, expected);
    }
}
