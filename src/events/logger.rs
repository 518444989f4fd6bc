use async_trait::async_trait;

use super::{EventError, EventPublisher};

/// Writes each event as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), EventError> {
        tracing::info!(topic = %topic, payload = %payload, "Payment event");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
