use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const CHARGE_SUCCEEDED: &str = "charge.succeeded";

/// Outer Stripe event envelope as delivered to the webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeEventData {
    /// Shape depends on the event type.
    pub object: serde_json::Value,
}

/// Subset of the Stripe Charge object we read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charge {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub receipt_url: Option<String>,
}

/// Events this service recognises. Everything else is carried as `Other`.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    ChargeSucceeded(Charge),
    Other(String),
}

impl WebhookEvent {
    pub fn from_stripe(event: StripeEvent) -> Result<Self, serde_json::Error> {
        match event.event_type.as_str() {
            CHARGE_SUCCEEDED => {
                let charge: Charge = serde_json::from_value(event.data.object)?;
                Ok(WebhookEvent::ChargeSucceeded(charge))
            }
            _ => Ok(WebhookEvent::Other(event.event_type)),
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            WebhookEvent::ChargeSucceeded(_) => CHARGE_SUCCEEDED,
            WebhookEvent::Other(event_type) => event_type,
        }
    }
}

/// Payload published on `payment.succeeded`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSucceeded {
    pub stripe_payment_id: String,
    pub order_id: Option<String>,
    pub receipt_url: Option<String>,
}

impl From<&Charge> for PaymentSucceeded {
    fn from(charge: &Charge) -> Self {
        Self {
            stripe_payment_id: charge.id.clone(),
            order_id: charge.metadata.get("orderId").cloned(),
            receipt_url: charge.receipt_url.clone(),
        }
    }
}
