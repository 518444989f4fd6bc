pub mod payments;
pub mod stripe;

pub use payments::{PaymentsService, WebhookOutcome};
pub use stripe::StripeClient;
