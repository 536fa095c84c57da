//! Request middleware for body limits and rate limiting.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::auth::bearer_token;
use crate::server::AppState;

/// Burst: 20 requests in 10 seconds
pub const RATE_LIMIT_BURST_REQUESTS: usize = 20;
pub const RATE_LIMIT_BURST_WINDOW: Duration = Duration::from_secs(10);

/// Sustained: 100 requests per minute
pub const RATE_LIMIT_SUSTAINED_REQUESTS: usize = 100;
pub const RATE_LIMIT_SUSTAINED_WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window limiter keyed by session user, or by peer when anonymous.
#[derive(Clone, Default)]
pub struct RateLimiter {
    requests: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request for `key` unless either tier is exhausted.
    pub async fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut requests = self.requests.write().await;
        let seen = requests.entry(key.to_string()).or_default();

        let burst_count = seen
            .iter()
            .filter(|&&ts| now.duration_since(ts) < RATE_LIMIT_BURST_WINDOW)
            .count();
        if burst_count >= RATE_LIMIT_BURST_REQUESTS {
            warn!(
                "Burst rate limit exceeded for {} ({}/{})",
                mask_token(key),
                burst_count,
                RATE_LIMIT_BURST_REQUESTS
            );
            return false;
        }

        let sustained_count = seen
            .iter()
            .filter(|&&ts| now.duration_since(ts) < RATE_LIMIT_SUSTAINED_WINDOW)
            .count();
        if sustained_count >= RATE_LIMIT_SUSTAINED_REQUESTS {
            warn!(
                "Sustained rate limit exceeded for {} ({}/{})",
                mask_token(key),
                sustained_count,
                RATE_LIMIT_SUSTAINED_REQUESTS
            );
            return false;
        }

        seen.retain(|&ts| now.duration_since(ts) < RATE_LIMIT_SUSTAINED_WINDOW);
        seen.push(now);
        true
    }

    pub async fn request_count(&self, key: &str) -> usize {
        self.requests.read().await.get(key).map(Vec::len).unwrap_or(0)
    }

    /// Drop keys with no request inside the sustained window.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        requests.retain(|_, timestamps| {
            timestamps.retain(|&ts| now.duration_since(ts) < RATE_LIMIT_SUSTAINED_WINDOW);
            !timestamps.is_empty()
        });
        debug!("Rate limiter cleanup: {} active keys", requests.len());
    }
}

/// Mask a token for logging (first 8 chars only)
pub fn mask_token(token: &str) -> String {
    match token.get(..8) {
        Some(prefix) if token.len() > 8 => format!("{}...", prefix),
        _ => "***".to_string(),
    }
}

fn reject(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

/// Rejects requests whose declared Content-Length exceeds the configured limit.
pub async fn body_size_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limit = state.config.server.max_body_bytes;
    let declared = request
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok());

    if let Some(length) = declared {
        if length > limit {
            warn!("Request body too large: {} bytes (max: {})", length, limit);
            return reject(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }
    }

    next.run(request).await
}

/// Rate limit per signed-in user, falling back to the peer address.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = rate_limit_key(&state, &request);

    if !state.rate_limiter.check(&key).await {
        return reject(StatusCode::TOO_MANY_REQUESTS, "Too many requests");
    }

    next.run(request).await
}

/// Unvalidated tokens share their peer's bucket, so rotating them gains nothing.
fn rate_limit_key(state: &AppState, request: &Request) -> String {
    let user = bearer_token(request.headers())
        .and_then(|token| match state.store.session_user(token, Utc::now()) {
            Ok(user) => user,
            Err(e) => {
                warn!("Session lookup failed during rate limiting: {:#}", e);
                None
            }
        });
    match user {
        Some(user_id) => format!("user:{}", user_id),
        None => format!("peer:{}", peer_addr(request, state.config.server.trust_forwarded_for)),
    }
}

/// Socket peer address; the first X-Forwarded-For hop only when trusted.
fn peer_addr(request: &Request, trust_forwarded_for: bool) -> String {
    let forwarded = trust_forwarded_for
        .then(|| {
            request
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .map(|ip| ip.trim().to_string())
                .filter(|ip| !ip.is_empty())
        })
        .flatten();

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::Store;
    use axum::body::Body;

    fn state(trust_forwarded_for: bool) -> AppState {
        let mut config = Config::default();
        config.server.trust_forwarded_for = trust_forwarded_for;
        AppState::new(config, Store::open_in_memory().unwrap(), None)
    }

    fn request(token: Option<&str>, forwarded: Option<&str>, peer: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/v1");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        if let Some(forwarded) = forwarded {
            builder = builder.header("x-forwarded-for", forwarded);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        if let Some(peer) = peer {
            let addr: SocketAddr = peer.parse().unwrap();
            request.extensions_mut().insert(ConnectInfo(addr));
        }
        request
    }

    #[test]
    fn test_unknown_tokens_share_peer_key() {
        let state = state(false);
        let a = rate_limit_key(&state, &request(Some("fake-one"), None, Some("10.0.0.7:5000")));
        let b = rate_limit_key(&state, &request(Some("fake-two"), None, Some("10.0.0.7:5001")));
        assert_eq!(a, "peer:10.0.0.7");
        assert_eq!(a, b);
    }

    #[test]
    fn test_forwarded_for_ignored_unless_trusted() {
        let req = || request(None, Some("203.0.113.9, 10.0.0.1"), Some("10.0.0.7:5000"));
        assert_eq!(rate_limit_key(&state(false), &req()), "peer:10.0.0.7");
        assert_eq!(rate_limit_key(&state(true), &req()), "peer:203.0.113.9");
        assert_eq!(rate_limit_key(&state(false), &request(None, None, None)), "peer:unknown");
    }

    #[test]
    fn test_valid_session_keys_by_user() {
        let state = state(false);
        let user = state
            .store
            .create_user("a@example.com", "alice", "h", "s")
            .unwrap()
            .unwrap();
        let token = crate::auth::issue_token(&state.store, &state.config.auth, user.id).unwrap();
        let key = rate_limit_key(&state, &request(Some(&token), None, Some("10.0.0.7:5000")));
        assert_eq!(key, format!("user:{}", user.id));
    }

    #[tokio::test]
    async fn test_burst_limit() {
        let limiter = RateLimiter::new();
        for i in 1..=RATE_LIMIT_BURST_REQUESTS {
            assert!(
                limiter.check("token:abc").await,
                "Request {} should succeed within burst limit",
                i
            );
        }
        assert!(!limiter.check("token:abc").await);
        // Other keys are independent
        assert!(limiter.check("token:def").await);
        assert_eq!(limiter.request_count("token:abc").await, RATE_LIMIT_BURST_REQUESTS);
    }

    #[tokio::test]
    async fn test_burst_window_resets() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        for _ in 0..RATE_LIMIT_BURST_REQUESTS {
            assert!(limiter.check_at("peer:10.0.0.1", start).await);
        }
        assert!(!limiter.check_at("peer:10.0.0.1", start).await);

        let later = start + RATE_LIMIT_BURST_WINDOW + Duration::from_millis(1);
        assert!(limiter.check_at("peer:10.0.0.1", later).await);
    }

    #[tokio::test]
    async fn test_sustained_limit() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        // Spread requests so no burst window fills up
        for i in 0..RATE_LIMIT_SUSTAINED_REQUESTS {
            let at = start + Duration::from_millis(i as u64 * 550);
            assert!(limiter.check_at("peer:10.0.0.2", at).await, "request {}", i);
        }
        let at = start + Duration::from_millis(RATE_LIMIT_SUSTAINED_REQUESTS as u64 * 550);
        assert!(!limiter.check_at("peer:10.0.0.2", at).await);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent() {
        let limiter = RateLimiter::new();
        for i in 0..5 {
            limiter.check(&format!("peer:127.0.0.{}", i)).await;
        }
        limiter.cleanup().await;
        assert_eq!(limiter.requests.read().await.len(), 5);
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token("12345678"), "***");
        assert_eq!(mask_token("1234567890abcdef"), "12345678...");
    }
}
