//! Shopping cart types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::error::ModelError;

/// One line of a [`Cart`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Line identifier.
    pub id: u64,
    /// The product in the cart.
    pub product: Product,
    /// Units of the product.
    pub quantity: u32,
    /// `quantity * price`, computed by the backend.
    pub subtotal: f64,
}

/// The current user's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Cart identifier.
    pub id: u64,
    /// Cart lines.
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Sum of all subtotals.
    pub total_amount: f64,
    /// Creation time.
    pub created_at: NaiveDateTime,
    /// Last update time.
    pub updated_at: NaiveDateTime,
}

impl Cart {
    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Body of `POST /product-service/cart/items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    /// Product to add.
    pub product_id: u64,
    /// Units to add, at least 1.
    pub quantity: u32,
}

impl AddToCart {
    /// Build a request, rejecting a zero quantity.
    pub fn new(product_id: u64, quantity: u32) -> Result<Self, ModelError> {
        if quantity == 0 {
            return Err(ModelError::InvalidQuantity { value: quantity });
        }
        Ok(Self {
            product_id,
            quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_to_cart_rejects_zero() {
        assert_eq!(
            AddToCart::new(1, 0),
            Err(ModelError::InvalidQuantity { value: 0 })
        );
        let add = AddToCart::new(9, 2).unwrap();
        assert_eq!(
            serde_json::to_string(&add).unwrap(),
            r#"{"productId":9,"quantity":2}"#
        );
    }

    #[test]
    fn empty_cart_has_no_units() {
        let cart: Cart = serde_json::from_str(
            r#"{"id": 1, "totalAmount": 0.0,
                "createdAt": "2024-01-01T00:00:00", "updatedAt": "2024-01-01T00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(cart.unit_count(), 0);
    }
}
