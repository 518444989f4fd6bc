pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod services;
pub mod websocket;

use std::sync::Arc;

use crate::config::Config;
use crate::events::EventPipeline;
use crate::services::PaymentsService;
use crate::websocket::PaymentBroadcaster;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub payments: Arc<PaymentsService>,
    pub broadcaster: Option<Arc<PaymentBroadcaster>>,
}

impl AppState {
    pub fn new(config: Config, payments: PaymentsService, broadcaster: Option<Arc<PaymentBroadcaster>>) -> Self {
        Self {
            config: Arc::new(config),
            payments: Arc::new(payments),
            broadcaster,
        }
    }

    /// Wires the Stripe client and the configured event sink together.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let EventPipeline {
            publisher,
            broadcaster,
        } = events::build_pipeline(&config.events)?;

        let payments = PaymentsService::new(&config.stripe, publisher)?;

        Ok(Self::new(config, payments, broadcaster))
    }
}
