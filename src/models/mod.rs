pub mod checkout;
pub mod webhook_event;

pub use checkout::*;
pub use webhook_event::*;
