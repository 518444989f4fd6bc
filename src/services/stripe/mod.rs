mod checkout;
mod client;
mod webhooks;

pub use checkout::*;
pub use client::StripeClient;
pub use webhooks::*;
