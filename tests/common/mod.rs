#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use parking_lot::Mutex;
use tower::ServiceExt;

use payments_service::{
    api::create_router,
    config::{Config, EventSink, EventsConfig, RateLimitConfig, ServerConfig, StripeConfig},
    events::{EventError, EventPublisher},
    services::{stripe::StripeWebhookVerifier, PaymentsService},
    websocket::PaymentBroadcaster,
    AppState,
};

pub const ENDPOINT_SECRET: &str = "whsec_integration";

#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<(String, serde_json::Value)>>,
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), EventError> {
        self.published.lock().push((topic.to_string(), payload));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub fn test_config(stripe_api_base: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        stripe: StripeConfig {
            secret_key: "sk_test_123".to_string(),
            endpoint_secret: ENDPOINT_SECRET.to_string(),
            success_url: "http://localhost:3003/payments/success".to_string(),
            cancel_url: "http://localhost:3003/payments/cancel".to_string(),
            api_base: stripe_api_base.to_string(),
            webhook_tolerance_secs: 300,
        },
        events: EventsConfig {
            sink: EventSink::Log,
            bus_url: None,
            channel_capacity: 16,
        },
        rate_limit: RateLimitConfig {
            requests_per_second: 100,
            burst_size: 100,
        },
    }
}

pub fn app_with_publisher(config: Config, publisher: Arc<dyn EventPublisher>) -> Router {
    let payments = PaymentsService::new(&config.stripe, publisher).unwrap();
    create_router(AppState::new(config, payments, None))
}

pub fn app_with_broadcaster(config: Config) -> (Router, Arc<PaymentBroadcaster>) {
    let broadcaster = Arc::new(PaymentBroadcaster::with_capacity(16));
    let payments = PaymentsService::new(&config.stripe, broadcaster.clone()).unwrap();
    let router = create_router(AppState::new(config, payments, Some(broadcaster.clone())));
    (router, broadcaster)
}

pub fn sign(payload: &[u8]) -> String {
    StripeWebhookVerifier::new(ENDPOINT_SECRET, 300)
        .sign(payload, chrono::Utc::now().timestamp())
        .unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn webhook_request(body: Vec<u8>, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/payments/webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("stripe-signature", signature);
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn session_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/payments/create-payment-session")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
