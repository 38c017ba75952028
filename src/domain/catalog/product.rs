//! Product stock record.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProductId, ValidationError};

/// The slice of a catalog product the approval workflow touches.
///
/// Catalog management lives elsewhere; here a product is a name, a stock
/// counter that never goes negative, and the access instructions handed to
/// customers on approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub stock: u32,

    /// Shown to the customer with each provisioned subscription.
    pub delivery_instructions: Option<String>,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, stock: u32) -> Self {
        Self {
            id,
            name: name.into(),
            stock,
            delivery_instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.delivery_instructions = Some(instructions.into());
        self
    }

    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }

    /// Removes `quantity` units, refusing to go below zero.
    pub fn decrement(&mut self, quantity: u32) -> Result<u32, ValidationError> {
        self.stock = self.stock.checked_sub(quantity).ok_or_else(|| {
            ValidationError::out_of_range(
                "stock",
                0,
                i64::from(self.stock),
                i64::from(self.stock) - i64::from(quantity),
            )
        })?;
        Ok(self.stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_reduces_stock() {
        let mut product = Product::new(ProductId::new(), "Design Suite", 3);
        assert_eq!(product.decrement(2).unwrap(), 1);
        assert_eq!(product.stock, 1);
    }

    #[test]
    fn decrement_below_zero_is_refused_and_leaves_stock() {
        let mut product = Product::new(ProductId::new(), "Design Suite", 1);
        assert!(!product.has_stock_for(2));
        assert!(product.decrement(2).is_err());
        assert_eq!(product.stock, 1);
    }

    #[test]
    fn exact_stock_can_be_taken() {
        let mut product = Product::new(ProductId::new(), "AI Assistant", 2);
        assert!(product.has_stock_for(2));
        assert_eq!(product.decrement(2).unwrap(), 0);
    }
}
