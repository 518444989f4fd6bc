use std::sync::Arc;

use validator::Validate;

use crate::config::StripeConfig;
use crate::error::{AppError, AppResult};
use crate::events::{EventPublisher, PAYMENT_SUCCEEDED};
use crate::models::{PaymentSessionRequest, PaymentSessionResponse, PaymentSucceeded, WebhookEvent};
use crate::services::stripe::{CreateCheckoutSession, StripeClient, StripeWebhookVerifier};

/// What happened to a verified webhook.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Dispatched {
        event_id: String,
        payload: PaymentSucceeded,
    },
    Ignored {
        event_id: String,
        event_type: String,
    },
}

pub struct PaymentsService {
    stripe: StripeClient,
    verifier: StripeWebhookVerifier,
    publisher: Arc<dyn EventPublisher>,
    success_url: String,
    cancel_url: String,
}

impl PaymentsService {
    pub fn new(config: &StripeConfig, publisher: Arc<dyn EventPublisher>) -> AppResult<Self> {
        Ok(Self {
            stripe: StripeClient::new(config)?,
            verifier: StripeWebhookVerifier::new(
                config.endpoint_secret.clone(),
                config.webhook_tolerance_secs,
            ),
            publisher,
            success_url: config.success_url.clone(),
            cancel_url: config.cancel_url.clone(),
        })
    }

    pub fn publisher_name(&self) -> &'static str {
        self.publisher.name()
    }

    pub async fn create_payment_session(
        &self,
        request: &PaymentSessionRequest,
    ) -> AppResult<PaymentSessionResponse> {
        request.validate()?;

        let checkout = CreateCheckoutSession {
            currency: &request.currency,
            items: &request.items,
            order_id: &request.order_id,
            success_url: &self.success_url,
            cancel_url: &self.cancel_url,
        };

        let session = self.stripe.create_checkout_session(&checkout).await?;

        tracing::info!(
            session_id = %session.id,
            order_id = %request.order_id,
            items = request.items.len(),
            "Checkout session created"
        );

        Ok(PaymentSessionResponse {
            cancel_url: session.cancel_url,
            success_url: session.success_url,
            url: session.url,
        })
    }

    /// Verify a Stripe webhook and forward `charge.succeeded` downstream.
    ///
    /// No replay protection: the same verified delivery is dispatched every time.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> AppResult<WebhookOutcome> {
        let event = self.verifier.construct_event(payload, signature)?;
        self.dispatch(event).await
    }

    async fn dispatch(&self, event: crate::models::StripeEvent) -> AppResult<WebhookOutcome> {
        let event_id = event.id.clone();
        tracing::debug!(
            event_id = %event_id,
            event_type = %event.event_type,
            created = event.created,
            livemode = event.livemode,
            "Verified webhook event"
        );

        let parsed = WebhookEvent::from_stripe(event)
            .map_err(|e| AppError::WebhookSignature(format!("Invalid event object: {}", e)))?;

        match parsed {
            WebhookEvent::ChargeSucceeded(charge) => {
                let payload = PaymentSucceeded::from(&charge);
                let value = serde_json::to_value(&payload)?;

                if let Err(e) = self.publisher.publish(PAYMENT_SUCCEEDED, value).await {
                    tracing::error!(
                        event_id = %event_id,
                        publisher = self.publisher.name(),
                        error = %e,
                        "Failed to hand off payment event"
                    );
                }

                tracing::info!(
                    event_id = %event_id,
                    stripe_payment_id = %payload.stripe_payment_id,
                    order_id = ?payload.order_id,
                    "Charge succeeded"
                );

                Ok(WebhookOutcome::Dispatched { event_id, payload })
            }
            WebhookEvent::Other(event_type) => {
                tracing::info!(event_id = %event_id, "Unhandled event type {}", event_type);
                Ok(WebhookOutcome::Ignored {
                    event_id,
                    event_type,
                })
            }
        }
    }
}
