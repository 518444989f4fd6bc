use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use std::time::Duration;

use crate::api::handlers;
use crate::api::middleware::{create_rate_limiter, rate_limit_with_state, request_logging};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let limiter = create_rate_limiter(
        state.config.rate_limit.requests_per_second,
        state.config.rate_limit.burst_size,
    );

    // Public routes
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/payments/success", get(handlers::payment_success))
        .route("/payments/cancel", get(handlers::payment_cancel));

    // Webhook routes (signature verification, no rate limit)
    let webhook_routes = Router::new()
        .route("/payments/webhook", post(handlers::stripe_webhook));

    // Checkout routes
    let session_routes = Router::new()
        .route(
            "/payments/create-payment-session",
            post(handlers::create_payment_session),
        )
        .layer(middleware::from_fn_with_state(limiter, rate_limit_with_state));

    let mut router = Router::new()
        .merge(public_routes)
        .merge(webhook_routes)
        .merge(session_routes);

    // Event stream only exists when events are broadcast in-process
    if state.broadcaster.is_some() {
        router = router.route("/ws/payments", get(crate::websocket::ws_handler));
    }

    router
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
