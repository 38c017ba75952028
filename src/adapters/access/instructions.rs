//! Access assigner that hands out the product's delivery instructions.
//!
//! Each line gets the product's instructions plus a reference the customer
//! quotes to support to claim the account: `<order number>/<line>`.

use crate::domain::catalog::Product;
use crate::domain::order::{Order, OrderItem};
use crate::domain::subscription::AccessDetails;
use crate::ports::AccessAssigner;

const DEFAULT_FALLBACK: &str = "Our team will send your account details shortly.";

#[derive(Debug, Clone)]
pub struct InstructionAccessAssigner {
    fallback: String,
}

impl InstructionAccessAssigner {
    pub fn new() -> Self {
        Self {
            fallback: DEFAULT_FALLBACK.to_string(),
        }
    }

    /// Text used for products without delivery instructions.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }
}

impl Default for InstructionAccessAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessAssigner for InstructionAccessAssigner {
    fn assign(
        &self,
        product: &Product,
        item: &OrderItem,
        order: &Order,
        line: usize,
    ) -> AccessDetails {
        let instructions = product
            .delivery_instructions
            .as_deref()
            .unwrap_or(&self.fallback);
        let accounts = if item.quantity == 1 {
            "1 account".to_string()
        } else {
            format!("{} accounts", item.quantity)
        };
        AccessDetails::new(format!(
            "{}\n{}, reference {}/{}",
            instructions,
            accounts,
            order.order_number,
            line + 1
        ))
    }
}
