use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /payments/create-payment-session`.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionRequest {
    #[validate(length(min = 3, max = 3, message = "Currency must be 3 characters"))]
    pub currency: String,
    #[validate(length(min = 1, message = "At least one item is required"))]
    #[validate]
    pub items: Vec<LineItem>,
    #[validate(length(min = 1, message = "Order ID is required"))]
    pub order_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LineItem {
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,
    /// Unit price in major currency units, e.g. `12.99`.
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
}

impl LineItem {
    /// Unit price in minor units (cents), rounded half away from zero.
    pub fn unit_amount(&self) -> i64 {
        to_minor_units(self.price)
    }
}

pub fn to_minor_units(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

/// URLs handed back to the client after Stripe creates the session.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionResponse {
    pub cancel_url: Option<String>,
    pub success_url: Option<String>,
    pub url: Option<String>,
}
