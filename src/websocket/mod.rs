pub mod broadcaster;
pub mod handler;

pub use broadcaster::{BroadcastEvent, PaymentBroadcaster};
pub use handler::{ws_handler, WsMessage};
