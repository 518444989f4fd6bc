use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::events::{EventError, EventPublisher};

const BROADCAST_CHANNEL_SIZE: usize = 1000;

/// One published event as seen by in-process subscribers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BroadcastEvent {
    pub topic: String,
    pub payload: serde_json::Value,
    pub timestamp: i64,
}

#[derive(Clone)]
pub struct PaymentBroadcaster {
    sender: broadcast::Sender<BroadcastEvent>,
}

impl PaymentBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(BROADCAST_CHANNEL_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to payment events
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for PaymentBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for PaymentBroadcaster {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), EventError> {
        let event = BroadcastEvent {
            topic: topic.to_string(),
            payload,
            timestamp: chrono::Utc::now().timestamp(),
        };

        match self.sender.send(event) {
            Ok(count) => {
                tracing::debug!(topic = %topic, subscribers = count, "Broadcast payment event");
            }
            Err(_) => {
                // No active receivers - this is fine
                tracing::debug!(topic = %topic, "Broadcast payment event with no subscribers");
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "broadcast"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let broadcaster = PaymentBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster
            .publish("payment.succeeded", json!({ "orderId": "X" }))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, "payment.succeeded");
        assert_eq!(event.payload, json!({ "orderId": "X" }));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let broadcaster = PaymentBroadcaster::with_capacity(4);

        assert_eq!(broadcaster.subscriber_count(), 0);
        assert!(broadcaster.publish("payment.succeeded", json!({})).await.is_ok());
    }
}
