#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

//! Sliding-window rate limiting: per-(client, endpoint) windows of one
//! minute with per-endpoint limits, plus a global one-second window bounding
//! in-flight requests. One mutex guards the whole limiter; the hot path is
//! short relative to the I/O behind it.

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::{web, Error, HttpResponse};
use futures_util::future::LocalBoxFuture;
use serde_json::json;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::future::{ready, Ready};
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::api_state::ApiState;

/// Per-endpoint window length in seconds
const WINDOW_SECONDS: f64 = 60.0;
/// Global concurrency window in seconds
const GLOBAL_WINDOW_SECONDS: f64 = 1.0;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub requests_made: u32,
    /// Epoch seconds at which capacity frees up
    pub reset_time: i64,
}

#[derive(Default)]
struct LimiterState {
    /// client id -> endpoint key -> request timestamps
    requests: HashMap<String, HashMap<String, VecDeque<f64>>>,
    global: VecDeque<f64>,
}

/// Sliding-window request accounting. Time is passed in so tests can run
/// against a fixed clock.
#[derive(Default)]
pub struct SlidingWindowLimiter {
    state: Mutex<LimiterState>,
}

impl SlidingWindowLimiter {
    /// Check and record one request for a client/endpoint pair.
    pub fn check(
        &self,
        client_id: &str,
        endpoint: &str,
        limit: u32,
        window_seconds: f64,
        now: f64,
    ) -> RateDecision {
        let Ok(mut state) = self.state.lock() else {
            // A poisoned limiter fails open
            return RateDecision {
                allowed: true,
                requests_made: 0,
                reset_time: to_epoch(now + window_seconds),
            };
        };

        let queue = state
            .requests
            .entry(client_id.to_string())
            .or_default()
            .entry(endpoint.to_string())
            .or_default();

        let window_start = now - window_seconds;
        while queue.front().is_some_and(|&t| t < window_start) {
            queue.pop_front();
        }

        let current = u32::try_from(queue.len()).unwrap_or(u32::MAX);
        if current >= limit {
            let reset_time = queue
                .front()
                .map_or_else(|| to_epoch(now + window_seconds), |&oldest| {
                    to_epoch(oldest + window_seconds)
                });
            return RateDecision {
                allowed: false,
                requests_made: current,
                reset_time,
            };
        }

        queue.push_back(now);
        RateDecision {
            allowed: true,
            requests_made: current + 1,
            reset_time: to_epoch(now + window_seconds),
        }
    }

    /// Check and record one request against the global window.
    pub fn check_global(&self, limit: u32, window_seconds: f64, now: f64) -> (bool, u32) {
        let Ok(mut state) = self.state.lock() else {
            return (true, 0);
        };

        let window_start = now - window_seconds;
        while state.global.front().is_some_and(|&t| t < window_start) {
            state.global.pop_front();
        }

        let current = u32::try_from(state.global.len()).unwrap_or(u32::MAX);
        if current >= limit {
            return (false, current);
        }

        state.global.push_back(now);
        (true, current + 1)
    }
}

fn to_epoch(seconds: f64) -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let epoch = seconds as i64;
    epoch
}

fn wall_clock_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Client identity: first forwarded-for address (or the peer address) plus a
/// small hash of the user agent, so unrelated clients behind one NAT do not
/// share a bucket.
fn client_id(req: &ServiceRequest) -> String {
    let ip = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(
            || {
                req.connection_info()
                    .peer_addr()
                    .unwrap_or("unknown")
                    .to_string()
            },
            ToString::to_string,
        );

    let user_agent = req
        .headers()
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    let mut hasher = DefaultHasher::new();
    user_agent.hash(&mut hasher);

    format!("{ip}:{}", hasher.finish() % 10000)
}

fn endpoint_key(req: &ServiceRequest) -> String {
    format!("{}:{}", req.method(), req.path())
}

fn rate_limit_headers(limit: u32, remaining: u32, reset_time: i64) -> [(HeaderName, HeaderValue); 4] {
    [
        (
            HeaderName::from_static("x-ratelimit-limit"),
            header_value(limit.to_string()),
        ),
        (
            HeaderName::from_static("x-ratelimit-remaining"),
            header_value(remaining.to_string()),
        ),
        (
            HeaderName::from_static("x-ratelimit-reset"),
            header_value(reset_time.to_string()),
        ),
        (
            HeaderName::from_static("x-ratelimit-window"),
            HeaderValue::from_static("60"),
        ),
    ]
}

fn header_value(value: String) -> HeaderValue {
    HeaderValue::from_str(&value).unwrap_or(HeaderValue::from_static("0"))
}

fn rejection(detail: &str, limit: u32, current: u32, reset_time: i64, now: f64) -> HttpResponse {
    let retry_after = (reset_time - to_epoch(now)).max(1);

    let mut response = HttpResponse::build(StatusCode::TOO_MANY_REQUESTS).json(json!({
        "detail": detail,
        "limit": limit,
        "current": current,
        "reset_time": reset_time,
    }));

    for (name, value) in rate_limit_headers(limit, 0, reset_time) {
        response.headers_mut().insert(name, value);
    }
    response.headers_mut().insert(
        HeaderName::from_static("retry-after"),
        header_value(retry_after.to_string()),
    );

    response
}

/// Actix middleware wiring for the limiter
pub struct RateLimit;

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let Some(state) = req.app_data::<web::Data<ApiState>>().cloned() else {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            };

            if !state.rate_limit_config.enabled {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let now = wall_clock_now();
            let client = client_id(&req);
            let endpoint = endpoint_key(&req);
            let limit = state.rate_limit_config.limit_for(&endpoint);

            let (global_allowed, global_count) = state.rate_limiter.check_global(
                state.rate_limit_config.max_concurrent_requests,
                GLOBAL_WINDOW_SECONDS,
                now,
            );
            if !global_allowed {
                log::warn!(
                    "Global rate limit exceeded: {global_count}/{}",
                    state.rate_limit_config.max_concurrent_requests
                );
                let response = rejection(
                    "Too many concurrent requests globally",
                    limit,
                    global_count,
                    to_epoch(now + GLOBAL_WINDOW_SECONDS),
                    now,
                );
                return Ok(req.into_response(response).map_into_right_body());
            }

            let decision = state
                .rate_limiter
                .check(&client, &endpoint, limit, WINDOW_SECONDS, now);
            if !decision.allowed {
                log::warn!(
                    "Rate limit exceeded for {client} on {endpoint}: {}/{limit}",
                    decision.requests_made
                );
                let response = rejection(
                    "Rate limit exceeded",
                    limit,
                    decision.requests_made,
                    decision.reset_time,
                    now,
                );
                return Ok(req.into_response(response).map_into_right_body());
            }

            let mut res = service.call(req).await?;
            let remaining = limit.saturating_sub(decision.requests_made);
            for (name, value) in rate_limit_headers(limit, remaining, decision.reset_time) {
                res.headers_mut().insert(name, value);
            }
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_limit_then_reject() {
        let limiter = SlidingWindowLimiter::default();
        let now = 1_000_000.0;

        // All 30 requests inside one second succeed, remaining counts down
        for i in 0..30 {
            let decision = limiter.check("client:42", "GET:/api/knowledge/search", 30, 60.0, now);
            assert!(decision.allowed, "request {i} should be allowed");
            assert_eq!(decision.requests_made, i + 1);
            assert_eq!(30 - decision.requests_made, 29 - i);
        }

        // The 31st within the window is rejected with reset at oldest+window
        let rejected = limiter.check("client:42", "GET:/api/knowledge/search", 30, 60.0, now + 1.0);
        assert!(!rejected.allowed);
        assert_eq!(rejected.requests_made, 30);
        assert_eq!(rejected.reset_time, to_epoch(now + 60.0));

        // Retry-After would be about a minute
        let retry_after = rejected.reset_time - to_epoch(now + 1.0);
        assert!((58..=60).contains(&retry_after));
    }

    #[test]
    fn test_window_advance_restores_capacity() {
        let limiter = SlidingWindowLimiter::default();
        let now = 2_000_000.0;

        for _ in 0..30 {
            assert!(limiter.check("c", "GET:/x", 30, 60.0, now).allowed);
        }
        assert!(!limiter.check("c", "GET:/x", 30, 60.0, now + 30.0).allowed);

        // Past the window the full capacity is back
        let after = now + 61.0;
        for i in 0..30 {
            let decision = limiter.check("c", "GET:/x", 30, 60.0, after);
            assert!(decision.allowed, "request {i} after window should pass");
        }
    }

    #[test]
    fn test_clients_and_endpoints_are_independent() {
        let limiter = SlidingWindowLimiter::default();
        let now = 3_000_000.0;

        for _ in 0..5 {
            assert!(limiter.check("a", "GET:/x", 5, 60.0, now).allowed);
        }
        assert!(!limiter.check("a", "GET:/x", 5, 60.0, now).allowed);

        // Different client, same endpoint
        assert!(limiter.check("b", "GET:/x", 5, 60.0, now).allowed);
        // Same client, different endpoint
        assert!(limiter.check("a", "GET:/y", 5, 60.0, now).allowed);
    }

    #[test]
    fn test_global_window() {
        let limiter = SlidingWindowLimiter::default();
        let now = 4_000_000.0;

        for _ in 0..10 {
            assert!(limiter.check_global(10, 1.0, now).0);
        }
        assert!(!limiter.check_global(10, 1.0, now + 0.5).0);

        // One second later the window has drained
        assert!(limiter.check_global(10, 1.0, now + 1.5).0);
    }
}
