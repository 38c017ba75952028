//! Order aggregate.
//!
//! An order is one purchase attempt: line items, a total, how it was paid and
//! where it sits in the review lifecycle. The approval workflow is the only
//! writer of `status`; everything else reads it.
//!
//! # Invariants
//!
//! - At least one line item, every quantity >= 1
//! - `total` equals the sum of line totals at submission
//! - `decided_by`/`decided_at` are set exactly when `status` is terminal

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AdminId, ChatId, Money, OrderId, OrderNumber, ProductId, StateMachine, Timestamp, UserId,
    ValidationError,
};

use super::{Decision, DurationMonths, OrderStatus, PaymentMethod};

/// One product line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,

    /// Product name captured at submission, used in notices.
    pub product_name: String,

    pub quantity: u32,

    pub duration: DurationMonths,

    pub unit_price: Money,
}

impl OrderItem {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        duration: DurationMonths,
        unit_price: Money,
    ) -> Result<Self, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::out_of_range(
                "quantity",
                1,
                i64::from(u32::MAX),
                0,
            ));
        }
        Ok(Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            duration,
            unit_price,
        })
    }

    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// A customer's purchase request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    pub order_number: OrderNumber,

    /// Storefront user who placed the order.
    pub user_id: UserId,

    /// Where customer notices are delivered. `None` when the customer never
    /// linked a chat; notices are then skipped.
    pub customer_chat: Option<ChatId>,

    pub items: Vec<OrderItem>,

    pub total: Money,

    pub payment_method: PaymentMethod,

    /// Opaque reference to the uploaded receipt (file id or URL).
    pub receipt: Option<String>,

    pub status: OrderStatus,

    pub decided_by: Option<AdminId>,

    pub decided_at: Option<Timestamp>,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,
}

impl Order {
    /// Creates an order whose receipt has been submitted and awaits review.
    #[allow(clippy::too_many_arguments)]
    pub fn submitted_for_review(
        id: OrderId,
        order_number: OrderNumber,
        user_id: UserId,
        customer_chat: Option<ChatId>,
        items: Vec<OrderItem>,
        payment_method: PaymentMethod,
        receipt: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::empty_field("items"));
        }
        let now = Timestamp::now();
        let total = items.iter().map(OrderItem::line_total).sum();
        Ok(Self {
            id,
            order_number,
            user_id,
            customer_chat,
            items,
            total,
            payment_method,
            receipt: Some(receipt.into()),
            status: OrderStatus::PendingReview,
            decided_by: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Total quantity requested per product.
    ///
    /// Two lines for the same product share one stock counter, so stock checks
    /// must use the summed quantity. Fails if a sum does not fit in `u32`.
    pub fn quantities_by_product(&self) -> Result<BTreeMap<ProductId, u32>, ValidationError> {
        let mut totals: BTreeMap<ProductId, u32> = BTreeMap::new();
        for item in &self.items {
            let total = totals.entry(item.product_id).or_insert(0);
            *total = total.checked_add(item.quantity).ok_or_else(|| {
                ValidationError::invalid_format(
                    "quantity",
                    format!("total for product {} exceeds {}", item.product_id, u32::MAX),
                )
            })?;
        }
        Ok(totals)
    }

    /// Validates that `decision` is legal from the current status and returns
    /// the status it leads to.
    pub fn status_after(&self, decision: Decision) -> Result<OrderStatus, ValidationError> {
        self.status.transition_to(decision.target_status())
    }

    /// Applies a committed decision to this in-memory copy.
    pub fn record_decision(
        &mut self,
        decision: Decision,
        admin: AdminId,
        at: Timestamp,
    ) -> Result<(), ValidationError> {
        self.status = self.status_after(decision)?;
        self.decided_by = Some(admin);
        self.decided_at = Some(at);
        self.updated_at = at;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn item(product_id: ProductId, quantity: u32, months: u32) -> OrderItem {
        OrderItem::new(
            product_id,
            "Streaming Premium",
            quantity,
            DurationMonths::new(months).unwrap(),
            Money::from_cents(4_500),
        )
        .unwrap()
    }

    pub fn order_with(items: Vec<OrderItem>) -> Order {
        Order::submitted_for_review(
            OrderId::new(),
            OrderNumber::new("ORD-1001").unwrap(),
            UserId::new("user-1").unwrap(),
            Some(ChatId::new("5550001").unwrap()),
            items,
            PaymentMethod::BankTransfer,
            "receipt-file-1",
        )
        .unwrap()
    }
}
