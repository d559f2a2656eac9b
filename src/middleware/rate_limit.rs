use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{
    cache::{CacheStore, keys::rate_limit_key},
    config::Config,
    error::AppError,
};

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CacheStore>,
    window_secs: u64,
    max_requests: u64,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CacheStore>, config: &Config) -> Self {
        Self {
            store,
            window_secs: config.rate_limit_window().as_secs(),
            max_requests: u64::from(config.rate_limit_requests),
            trust_proxy_headers: config.trust_proxy_headers,
        }
    }

    pub async fn check_rate_limit(
        self: Arc<Self>,
        req: Request<Body>,
        next: Next,
    ) -> Result<Response, AppError> {
        let ip = client_ip(&req, self.trust_proxy_headers);
        let key = rate_limit_key(&ip);

        // The limiter shares the cache store's failure policy: an unreachable
        // store lets the request through.
        match self.store.incr_window(&key, self.window_secs).await {
            Ok(count) if count > self.max_requests => {
                tracing::warn!(client = %ip, count, "Rate limit exceeded");
                return Err(AppError::RateLimited);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Rate limiter skipped, cache store unavailable: {}", e),
        }

        Ok(next.run(req).await)
    }
}

/// The peer address, or `unknown` without connect info. Proxy headers take
/// precedence only when `trust_proxy_headers` is set; otherwise any caller
/// could pick a fresh key per request.
fn client_ip(req: &Request<Body>, trust_proxy_headers: bool) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    let forwarded = trust_proxy_headers
        .then(|| {
            req.headers()
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .or_else(|| {
                    req.headers()
                        .get("x-forwarded-for")
                        .and_then(|h| h.to_str().ok())
                        .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
                })
        })
        .flatten();

    forwarded
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    limiter.check_rate_limit(req, next).await
}
