use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::AppError;
use crate::AppState;

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Stripe webhook endpoint. Needs the raw body: the signature covers the exact bytes.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.payments.handle_webhook(&body, signature).await {
        Ok(_) => (StatusCode::OK, Json(WebhookAck { received: true })).into_response(),
        Err(err @ AppError::WebhookSignature(_)) => {
            tracing::warn!("Rejected Stripe webhook: {}", err);
            (
                StatusCode::BAD_REQUEST,
                Json(WebhookResponse {
                    success: false,
                    message: err.to_string(),
                }),
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}
