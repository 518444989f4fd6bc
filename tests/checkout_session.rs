mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

fn order() -> serde_json::Value {
    json!({
        "currency": "usd",
        "items": [
            { "name": "Keyboard", "price": 49.99, "quantity": 1 },
            { "name": "Cable", "price": 3.5, "quantity": 4 }
        ],
        "orderId": "order-1"
    })
}

#[tokio::test]
async fn test_creates_session_and_returns_provider_urls() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(header("authorization", "Basic c2tfdGVzdF8xMjM6"))
        .and(body_string_contains("mode=payment"))
        .and(body_string_contains("metadata%5BorderId%5D=order-1"))
        .and(body_string_contains(
            "payment_intent_data%5Bmetadata%5D%5BorderId%5D=order-1",
        ))
        .and(body_string_contains(
            "line_items%5B0%5D%5Bprice_data%5D%5Bunit_amount%5D=4999",
        ))
        .and(body_string_contains(
            "line_items%5B1%5D%5Bprice_data%5D%5Bunit_amount%5D=350",
        ))
        .and(body_string_contains("line_items%5B1%5D%5Bquantity%5D=4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1",
            "object": "checkout.session",
            "mode": "payment",
            "url": "https://checkout.stripe.com/c/pay/cs_test_1",
            "success_url": "http://localhost:3003/payments/success",
            "cancel_url": "http://localhost:3003/payments/cancel",
            "metadata": { "orderId": "order-1" }
        })))
        .expect(1)
        .mount(&stripe)
        .await;

    let app = app_with_publisher(test_config(&stripe.uri()), Arc::new(RecordingPublisher::default()));
    let response = send(&app, session_request(order())).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "cancelUrl": "http://localhost:3003/payments/cancel",
            "successUrl": "http://localhost:3003/payments/success",
            "url": "https://checkout.stripe.com/c/pay/cs_test_1"
        })
    );
}

#[tokio::test]
async fn test_provider_error_is_propagated() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "type": "invalid_request_error",
                "message": "Invalid currency: xyz"
            }
        })))
        .expect(1)
        .mount(&stripe)
        .await;

    let app = app_with_publisher(test_config(&stripe.uri()), Arc::new(RecordingPublisher::default()));
    let mut body = order();
    body["currency"] = json!("xyz");
    let response = send(&app, session_request(body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "STRIPE_ERROR");
    assert_eq!(body["error"]["message"], "Invalid currency: xyz");
}

#[tokio::test]
async fn test_invalid_orders_never_reach_stripe() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&stripe)
        .await;

    let app = app_with_publisher(test_config(&stripe.uri()), Arc::new(RecordingPublisher::default()));

    let empty_items = json!({ "currency": "usd", "items": [], "orderId": "order-1" });
    let negative_price = json!({
        "currency": "usd",
        "items": [{ "name": "Refund hack", "price": -5.0, "quantity": 1 }],
        "orderId": "order-1"
    });
    let zero_quantity = json!({
        "currency": "usd",
        "items": [{ "name": "Nothing", "price": 5.0, "quantity": 0 }],
        "orderId": "order-1"
    });

    for body in [empty_items, negative_price, zero_quantity] {
        let response = send(&app, session_request(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(!body["error"]["details"]["items"].is_null());
    }
}

#[tokio::test]
async fn test_session_endpoint_is_rate_limited() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "cs_test_2" })))
        .mount(&stripe)
        .await;

    let mut config = test_config(&stripe.uri());
    config.rate_limit.requests_per_second = 1;
    config.rate_limit.burst_size = 1;
    let app = app_with_publisher(config, Arc::new(RecordingPublisher::default()));

    let first = send(&app, session_request(order())).await;
    let second = send(&app, session_request(order())).await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_health_reports_event_sink() {
    let app = app_with_publisher(
        test_config("http://127.0.0.1:9"),
        Arc::new(RecordingPublisher::default()),
    );

    let response = send(
        &app,
        axum::http::Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["event_sink"], "recording");
}
