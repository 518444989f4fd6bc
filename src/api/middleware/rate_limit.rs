use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

use crate::error::AppError;

pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a new rate limiter with the specified requests per second and burst size.
/// Zero values are treated as one.
pub fn create_rate_limiter(requests_per_second: u32, burst_size: u32) -> SharedRateLimiter {
    let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst_size).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::per_second(per_second).allow_burst(burst);

    Arc::new(RateLimiter::direct(quota))
}

/// Token bucket shared by every caller of the routes it wraps.
pub async fn rate_limit_with_state(
    State(rate_limiter): State<SharedRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    match rate_limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(
                "Rate limit exceeded for request to {}",
                request.uri().path()
            );
            Err(AppError::RateLimitExceeded)
        }
    }
}
