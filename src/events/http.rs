use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{EventError, EventPublisher};

/// Relays events to an external bus gateway over HTTP.
///
/// The request runs on a spawned task; `publish` returns as soon as it is queued.
#[derive(Clone)]
pub struct HttpPublisher {
    http_client: Client,
    bus_url: String,
}

#[derive(Debug, Serialize)]
struct BusMessage<'a> {
    topic: &'a str,
    payload: &'a serde_json::Value,
}

impl HttpPublisher {
    pub fn new(bus_url: &str) -> Result<Self, EventError> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| EventError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            bus_url: bus_url.to_string(),
        })
    }

    /// Sends one message and waits for the bus to answer.
    pub async fn send(&self, topic: &str, payload: &serde_json::Value) -> Result<(), EventError> {
        let response = self
            .http_client
            .post(&self.bus_url)
            .json(&BusMessage { topic, payload })
            .send()
            .await
            .map_err(|e| EventError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(EventError::Publish {
                topic: topic.to_string(),
                reason: format!("bus responded with {}", response.status()),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl EventPublisher for HttpPublisher {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), EventError> {
        let publisher = self.clone();
        let topic = topic.to_string();

        tokio::spawn(async move {
            match publisher.send(&topic, &payload).await {
                Ok(()) => tracing::debug!(topic = %topic, "Event delivered to bus"),
                Err(e) => tracing::warn!(topic = %topic, error = %e, "Event delivery failed"),
            }
        });

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_posts_topic_and_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/publish"))
            .and(body_json(json!({
                "topic": "payment.succeeded",
                "payload": { "stripePaymentId": "ch_1", "orderId": "X", "receiptUrl": "https://r" }
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = HttpPublisher::new(&format!("{}/publish", server.uri())).unwrap();
        publisher
            .send(
                "payment.succeeded",
                &json!({ "stripePaymentId": "ch_1", "orderId": "X", "receiptUrl": "https://r" }),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_reports_bus_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let publisher = HttpPublisher::new(&server.uri()).unwrap();
        let err = publisher.send("payment.succeeded", &json!({})).await.unwrap_err();

        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_publish_delivers_in_background() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/publish"))
            .and(body_json(json!({
                "topic": "payment.succeeded",
                "payload": { "stripePaymentId": "ch_9", "orderId": "order-9", "receiptUrl": null }
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = HttpPublisher::new(&format!("{}/publish", server.uri())).unwrap();
        publisher
            .publish(
                "payment.succeeded",
                json!({ "stripePaymentId": "ch_9", "orderId": "order-9", "receiptUrl": null }),
            )
            .await
            .unwrap();

        let mut delivered = 0;
        for _ in 0..100 {
            delivered = server.received_requests().await.map(|r| r.len()).unwrap_or(0);
            if delivered > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn test_publish_does_not_wait_for_bus() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let publisher = HttpPublisher::new(&server.uri()).unwrap();
        let started = std::time::Instant::now();
        publisher.publish("payment.succeeded", json!({})).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
