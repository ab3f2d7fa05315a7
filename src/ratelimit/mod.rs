mod bucket;
mod client_ip;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::config::{LimitsConfig, TrustedProxiesConfig};

pub use client_ip::{extract_client_ip, extract_client_ip_from_request};

use bucket::BucketFamily;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BucketKind {
    Token,
    Authorize,
    Register,
}

/// C2: per-remote-IP token-bucket gate on `/authorize`, `/token`, and
/// `/register`. Each bucket family is independent; exceeding any one of
/// them denies the request with HTTP 429.
pub struct RateLimiter {
    token: BucketFamily,
    authorize: BucketFamily,
    register: BucketFamily,
    trusted_proxies: TrustedProxiesConfig,
}

impl RateLimiter {
    /// Builds the limiter and spawns the periodic full-table reset task
    /// (every 5 minutes) that bounds memory growth across distinct IPs.
    pub fn spawn(config: &LimitsConfig, trusted_proxies: TrustedProxiesConfig) -> Arc<Self> {
        let limiter = Arc::new(Self {
            token: BucketFamily::new(config.rate_limits.token),
            authorize: BucketFamily::new(config.rate_limits.authorize),
            register: BucketFamily::new(config.rate_limits.register),
            trusted_proxies,
        });

        let background = limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            interval.tick().await;
            loop {
                interval.tick().await;
                background.token.reset();
                background.authorize.reset();
                background.register.reset();
            }
        });

        limiter
    }

    fn family(&self, kind: BucketKind) -> &BucketFamily {
        match kind {
            BucketKind::Token => &self.token,
            BucketKind::Authorize => &self.authorize,
            BucketKind::Register => &self.register,
        }
    }

    fn check(&self, kind: BucketKind, req: &Request) -> Result<(), RateLimitError> {
        let ip = extract_client_ip_from_request(req, &self.trusted_proxies)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let family = self.family(kind);
        if family.check(&ip) {
            Ok(())
        } else {
            let retry_after = (1.0 / family.config().refill_rate_per_sec()).ceil().max(1.0) as u64;
            Err(RateLimitError::Exceeded { retry_after })
        }
    }
}

#[derive(Debug)]
pub enum RateLimitError {
    Exceeded { retry_after: u64 },
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let RateLimitError::Exceeded { retry_after } = self;
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({"error": "rate_limit_exceeded"})),
        )
            .into_response();
        if let Ok(value) = HeaderValue::try_from(retry_after.to_string()) {
            response.headers_mut().insert("Retry-After", value);
        }
        response
    }
}

pub async fn authorize_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    limiter.check(BucketKind::Authorize, &req)?;
    Ok(next.run(req).await)
}

pub async fn token_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    limiter.check(BucketKind::Token, &req)?;
    Ok(next.run(req).await)
}

pub async fn register_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    limiter.check(BucketKind::Register, &req)?;
    Ok(next.run(req).await)
}
