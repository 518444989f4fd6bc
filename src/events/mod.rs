//! Downstream delivery of payment notifications.
//!
//! The webhook receiver only knows about [`EventPublisher`]; which sink is
//! behind it (log line, in-process channel, external bus) is picked at startup
//! from [`EventsConfig`](crate::config::EventsConfig).

mod http;
mod logger;

pub use self::http::HttpPublisher;
pub use self::logger::LogPublisher;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{EventSink, EventsConfig};
use crate::websocket::PaymentBroadcaster;

pub const PAYMENT_SUCCEEDED: &str = "payment.succeeded";

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Failed to publish '{topic}': {reason}")]
    Publish { topic: String, reason: String },

    #[error("Event bus is not configured: {0}")]
    NotConfigured(String),
}

/// Fire-and-forget publisher for integration events.
///
/// Delivery is at-most-once. `publish` returning `Ok` means the event was
/// handed to the sink, not that anyone consumed it.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), EventError>;

    /// Short name for logs and the health endpoint.
    fn name(&self) -> &'static str;
}

/// Publisher plus the broadcaster backing it, when the sink is `broadcast`.
pub struct EventPipeline {
    pub publisher: Arc<dyn EventPublisher>,
    pub broadcaster: Option<Arc<PaymentBroadcaster>>,
}

pub fn build_pipeline(config: &EventsConfig) -> Result<EventPipeline, EventError> {
    match config.sink {
        EventSink::Log => Ok(EventPipeline {
            publisher: Arc::new(LogPublisher),
            broadcaster: None,
        }),
        EventSink::Broadcast => {
            let broadcaster = Arc::new(PaymentBroadcaster::with_capacity(config.channel_capacity));
            Ok(EventPipeline {
                publisher: broadcaster.clone(),
                broadcaster: Some(broadcaster),
            })
        }
        EventSink::Http => {
            let bus_url = config.bus_url.as_deref().ok_or_else(|| {
                EventError::NotConfigured("EVENTS_BUS_URL is not set".to_string())
            })?;
            Ok(EventPipeline {
                publisher: Arc::new(HttpPublisher::new(bus_url)?),
                broadcaster: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn EventPublisher) {}

    fn events_config(sink: EventSink, bus_url: Option<&str>) -> EventsConfig {
        EventsConfig {
            sink,
            bus_url: bus_url.map(str::to_string),
            channel_capacity: 8,
        }
    }

    #[test]
    fn test_log_pipeline() {
        let pipeline = build_pipeline(&events_config(EventSink::Log, None)).unwrap();

        assert_eq!(pipeline.publisher.name(), "log");
        assert!(pipeline.broadcaster.is_none());
    }

    #[test]
    fn test_broadcast_pipeline_exposes_broadcaster() {
        let pipeline = build_pipeline(&events_config(EventSink::Broadcast, None)).unwrap();

        assert_eq!(pipeline.publisher.name(), "broadcast");
        assert!(pipeline.broadcaster.is_some());
    }

    #[test]
    fn test_http_pipeline_needs_url() {
        assert!(build_pipeline(&events_config(EventSink::Http, None)).is_err());

        let pipeline =
            build_pipeline(&events_config(EventSink::Http, Some("http://bus.local/publish"))).unwrap();
        assert_eq!(pipeline.publisher.name(), "http");
    }
}
