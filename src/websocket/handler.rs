use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use super::BroadcastEvent;
use crate::events::PAYMENT_SUCCEEDED;
use crate::models::PaymentSucceeded;
use crate::AppState;

const HEARTBEAT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "subscribe")]
    Subscribe { order_ids: Vec<String> },
    #[serde(rename = "unsubscribe")]
    Unsubscribe { order_ids: Vec<String> },
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "pong")]
    Pong,
    #[serde(rename = "payment_succeeded")]
    PaymentSucceeded(PaymentSucceeded),
    #[serde(rename = "error")]
    Error { message: String },
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    match state.broadcaster.clone() {
        Some(broadcaster) => {
            let rx = broadcaster.subscribe();
            ws.on_upgrade(move |socket| handle_socket(socket, rx))
        }
        None => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Event stream requires EVENTS_SINK=broadcast",
        )
            .into_response(),
    }
}

/// Empty filter means the client wants every order.
fn wants(filter: &HashSet<String>, payload: &PaymentSucceeded) -> bool {
    filter.is_empty()
        || payload
            .order_id
            .as_ref()
            .map(|id| filter.contains(id))
            .unwrap_or(false)
}

fn to_ws_message(event: BroadcastEvent) -> Option<WsMessage> {
    if event.topic != PAYMENT_SUCCEEDED {
        return None;
    }
    match serde_json::from_value::<PaymentSucceeded>(event.payload) {
        Ok(payload) => Some(WsMessage::PaymentSucceeded(payload)),
        Err(e) => {
            tracing::warn!("Dropping malformed broadcast payload: {}", e);
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<BroadcastEvent>) {
    let (mut sender, mut receiver) = socket.split();

    let subscribed_orders: Arc<RwLock<HashSet<String>>> = Arc::new(RwLock::new(HashSet::new()));
    let subscribed_clone = subscribed_orders.clone();

    // Replies to client messages go out through the send task
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<WsMessage>();

    // Task to receive messages from the WebSocket client
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if let Some(reply) = handle_client_message(&text, &subscribed_clone) {
                        if reply_tx.send(reply).is_err() {
                            break;
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!("WebSocket client disconnected");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    // Task to send messages to the WebSocket client
    let mut send_task = tokio::spawn(async move {
        let period = std::time::Duration::from_secs(HEARTBEAT_SECS);
        let mut heartbeat_interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            let outgoing = tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(event) => {
                            let Some(msg) = to_ws_message(event) else { continue };
                            let deliver = match &msg {
                                WsMessage::PaymentSucceeded(payload) => {
                                    let subs = subscribed_orders.read();
                                    wants(&subs, payload)
                                }
                                _ => true,
                            };
                            if !deliver {
                                continue;
                            }
                            msg
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "WebSocket client lagged behind broadcasts");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                Some(reply) = reply_rx.recv() => reply,
                _ = heartbeat_interval.tick() => WsMessage::Pong,
            };

            if let Ok(json) = serde_json::to_string(&outgoing) {
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    }

    tracing::debug!("WebSocket connection closed");
}

/// Applies a client message to the connection's order filter and returns the reply, if any.
fn handle_client_message(text: &str, subscribed: &RwLock<HashSet<String>>) -> Option<WsMessage> {
    match serde_json::from_str::<WsMessage>(text) {
        Ok(WsMessage::Subscribe { order_ids }) => {
            let mut subs = subscribed.write();
            subs.extend(order_ids);
            tracing::debug!("Client subscribed to {} orders", subs.len());
            None
        }
        Ok(WsMessage::Unsubscribe { order_ids }) => {
            let mut subs = subscribed.write();
            for id in &order_ids {
                subs.remove(id);
            }
            None
        }
        Ok(WsMessage::Ping) => Some(WsMessage::Pong),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Failed to parse WebSocket message: {}", e);
            Some(WsMessage::Error {
                message: format!("Invalid message: {}", e),
            })
        }
    }
}
