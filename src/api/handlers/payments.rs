use axum::{extract::State, Json};
use serde::Serialize;
use crate::error::AppResult;
use crate::models::{PaymentSessionRequest, PaymentSessionResponse};
use crate::AppState;

pub async fn create_payment_session(
    State(state): State<AppState>,
    Json(request): Json<PaymentSessionRequest>,
) -> AppResult<Json<PaymentSessionResponse>> {
    let session = state.payments.create_payment_session(&request).await?;

    Ok(Json(session))
}

#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    pub ok: bool,
    pub message: String,
}

/// Landing target for `STRIPE_SUCCESS_URL` during local development.
pub async fn payment_success() -> Json<RedirectResponse> {
    Json(RedirectResponse {
        ok: true,
        message: "Payment successful".to_string(),
    })
}

pub async fn payment_cancel() -> Json<RedirectResponse> {
    Json(RedirectResponse {
        ok: true,
        message: "Payment cancelled".to_string(),
    })
}
