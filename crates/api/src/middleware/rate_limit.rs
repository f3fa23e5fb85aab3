//! Per-client-IP rate limiting for public mutation routes and login.

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
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use serde_json::json;
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr},
    num::NonZeroU32,
    sync::{Arc, RwLock},
};

use crate::app::AppState;
use crate::extractors::client_ip::resolve_client_ip;

type IpRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Upper bound on tracked clients before the map is reset.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// One limiter per client IP, all sharing the same quota.
pub struct RateLimiterState {
    limiters: RwLock<HashMap<IpAddr, Arc<IpRateLimiter>>>,
    quota: Quota,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    /// Returns `None` when `rate_limit_per_minute` is 0 (disabled).
    pub fn new(rate_limit_per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiters: RwLock::new(HashMap::new()),
            quota: Quota::per_minute(per_minute),
            rate_limit_per_minute,
        })
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    fn get_or_create_limiter(&self, ip: IpAddr) -> Arc<IpRateLimiter> {
        {
            let limiters = self.limiters.read().unwrap_or_else(|e| e.into_inner());
            if let Some(limiter) = limiters.get(&ip) {
                return limiter.clone();
            }
        }

        let mut limiters = self.limiters.write().unwrap_or_else(|e| e.into_inner());
        if let Some(limiter) = limiters.get(&ip) {
            return limiter.clone();
        }
        if limiters.len() >= MAX_TRACKED_CLIENTS {
            tracing::warn!(tracked = limiters.len(), "Rate limiter map full, resetting");
            limiters.clear();
        }

        let limiter = Arc::new(GovRateLimiter::direct(self.quota));
        limiters.insert(ip, limiter.clone());
        limiter
    }

    /// `Err(retry_after_secs)` when the client is over its quota.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        let limiter = self.get_or_create_limiter(ip);
        limiter.check().map_err(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            wait.as_secs().max(1)
        })
    }

    fn tracked_clients(&self) -> usize {
        self.limiters.read().map(|l| l.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_clients", &self.tracked_clients())
            .finish()
    }
}

/// Limits booking and contact submissions.
pub async fn public_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    enforce(state.public_limiter.as_deref(), "public", req, next).await
}

/// Limits login attempts.
pub async fn login_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    enforce(state.login_limiter.as_deref(), "login", req, next).await
}

async fn enforce(
    limiter: Option<&RateLimiterState>,
    scope: &'static str,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = limiter else {
        return next.run(req).await;
    };

    // Without any address information all such clients share one bucket
    let ip = resolve_client_ip(req.headers(), req.extensions())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if let Err(retry_after) = limiter.check(ip) {
        tracing::warn!(client_ip = %ip, scope = scope, retry_after, "Rate limit exceeded");
        metrics::counter!("rate_limited_requests_total", "scope" => scope).increment(1);
        return rate_limited_response(limiter.rate_limit_per_minute(), retry_after);
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
