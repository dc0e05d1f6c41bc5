//! Order types.

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::error::ModelError;

/// Lifecycle state of an [`Order`].
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum OrderStatus {
    /// Placed, awaiting the seller.
    Pending,
    /// Accepted by the seller.
    Confirmed,
    /// Being prepared.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Received by the buyer.
    Delivered,
    /// Cancelled before delivery.
    Cancelled,
    /// Refunded after delivery.
    Refunded,
}

impl OrderStatus {
    /// Whether no further transitions are expected.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Refunded)
    }

    /// Parse a status name, mapping failures to [`ModelError`].
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        Self::from_str(value).map_err(|_| ModelError::UnknownOrderStatus {
            value: value.to_string(),
        })
    }
}

/// A receipt issued for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Receipt identifier.
    pub id: u64,
    /// Human-facing receipt number.
    pub receipt_number: String,
    /// Issue time.
    pub issued_at: NaiveDateTime,
    /// Free-form details.
    #[serde(default)]
    pub details: String,
}

/// One line of an [`Order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Line identifier.
    pub id: u64,
    /// Ordered product.
    pub product: Product,
    /// Units ordered.
    pub quantity: u32,
    /// Unit price when the order was placed.
    pub price_at_purchase: f64,
    /// `quantity * price_at_purchase`.
    pub subtotal: f64,
}

/// An order placed from a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order identifier.
    pub id: u64,
    /// Buyer e-mail.
    pub user_email: String,
    /// Order lines.
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Order total.
    pub total_amount: f64,
    /// Current status.
    pub status: OrderStatus,
    /// Receipt, once issued.
    #[serde(default)]
    pub receipt: Option<Receipt>,
    /// Creation time.
    pub created_at: NaiveDateTime,
    /// Last update time.
    pub updated_at: NaiveDateTime,
}
