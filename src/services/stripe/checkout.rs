use serde::Deserialize;

use super::StripeClient;
use crate::error::AppResult;
use crate::models::LineItem;

/// Checkout session parameters before form encoding.
#[derive(Debug, Clone)]
pub struct CreateCheckoutSession<'a> {
    pub currency: &'a str,
    pub items: &'a [LineItem],
    pub order_id: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

impl CreateCheckoutSession<'_> {
    /// Flattens the request into Stripe's bracketed form keys.
    ///
    /// The order id goes on the session and on the payment intent; Stripe copies
    /// the payment intent metadata onto the charge that the webhook later reports.
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.success_url.to_string()),
            ("cancel_url".to_string(), self.cancel_url.to_string()),
            ("metadata[orderId]".to_string(), self.order_id.to_string()),
            (
                "payment_intent_data[metadata][orderId]".to_string(),
                self.order_id.to_string(),
            ),
        ];

        for (i, item) in self.items.iter().enumerate() {
            form.push((
                format!("line_items[{}][price_data][currency]", i),
                self.currency.to_string(),
            ));
            form.push((
                format!("line_items[{}][price_data][product_data][name]", i),
                item.name.clone(),
            ));
            form.push((
                format!("line_items[{}][price_data][unit_amount]", i),
                item.unit_amount().to_string(),
            ));
            form.push((format!("line_items[{}][quantity]", i), item.quantity.to_string()));
        }

        form
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

impl StripeClient {
    pub async fn create_checkout_session(
        &self,
        request: &CreateCheckoutSession<'_>,
    ) -> AppResult<CheckoutSession> {
        self.post_form("/v1/checkout/sessions", &request.to_form()).await
    }
}
