//! Per-client-IP rate limiting for admin login.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use serde_json::json;
use std::net::IpAddr;
use std::num::NonZeroU32;
use tracing::warn;

use crate::app::AppState;
use crate::extractors::client_ip;

type IpRateLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

pub struct LoginRateLimiter {
    limiter: IpRateLimiter,
    per_minute: u32,
}

impl LoginRateLimiter {
    /// `None` when the limit is 0 (disabled).
    pub fn new(per_minute: u32) -> Option<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute)?);
        Some(Self {
            limiter: RateLimiter::keyed(quota),
            per_minute,
        })
    }

    pub fn per_minute(&self) -> u32 {
        self.per_minute
    }

    /// `Err(retry_after_secs)` when `ip` is over its quota.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        self.limiter.check_key(&ip).map_err(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            wait.as_secs().max(1)
        })
    }
}

impl std::fmt::Debug for LoginRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRateLimiter")
            .field("per_minute", &self.per_minute)
            .finish()
    }
}

pub async fn login_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(ref limiter) = state.login_limiter {
        let ip = client_ip(req.headers(), req.extensions());
        if let Err(retry_after) = limiter.check(ip) {
            warn!(client_ip = %ip, "Admin login rate limit exceeded");
            metrics::counter!("admin_login_rate_limited_total").increment(1);
            return rate_limited_response(limiter.per_minute(), retry_after);
        }
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limit_exceeded",
        "message": format!("Too many login attempts; limit is {} per minute", limit),
        "retryAfter": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
