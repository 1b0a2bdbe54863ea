//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Two limiter classes:
//! - `checkout_rate_limiter`: strict, for endpoints that create orders or
//!   payments (~10/min)
//! - `api_rate_limiter`: relaxed, for quotes, lookups and status polling
//!   (~60/min with a burst of 50)
//!
//! The payment webhook is never rate limited.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use thiserror::Error;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers carrying the client IP, in order of trust.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

/// Key extractor for Cloudflare and Fly.io.
///
/// Checks `CF-Connecting-IP`, the first `X-Forwarded-For` hop, `X-Real-IP`
/// and `Fly-Client-IP`, then the socket peer address when the server runs
/// without a proxy in front.
#[derive(Clone, Copy)]
pub struct CloudflareIpKeyExtractor;

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<IpAddr> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

impl tower_governor::key_extractor::KeyExtractor for CloudflareIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let [cloudflare, real_ip, fly] = CLIENT_IP_HEADERS;
        header_ip(req, cloudflare)
            .or_else(|| header_ip(req, "x-forwarded-for"))
            .or_else(|| header_ip(req, real_ip))
            .or_else(|| header_ip(req, fly))
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<CloudflareIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// A limiter quota was rejected by `GovernorConfigBuilder`.
#[derive(Debug, Error)]
#[error("invalid rate limiter quota: {name}")]
pub struct RateLimitConfigError {
    name: &'static str,
}

fn limiter(
    name: &'static str,
    replenish_seconds: u64,
    burst: u32,
) -> Result<RateLimiterLayer, RateLimitConfigError> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(CloudflareIpKeyExtractor)
        .per_second(replenish_seconds)
        .burst_size(burst)
        .finish()
        .ok_or(RateLimitConfigError { name })?;
    Ok(GovernorLayer::new(Arc::new(config)))
}

/// Strict limiter for checkout and payment retry: one token every 6 seconds,
/// burst of 5.
///
/// # Errors
///
/// Returns an error if governor rejects the quota.
pub fn checkout_rate_limiter() -> Result<RateLimiterLayer, RateLimitConfigError> {
    limiter("checkout", 6, 5)
}

/// Relaxed limiter for read-only endpoints: one token per second, burst of 50.
///
/// # Errors
///
/// Returns an error if governor rejects the quota.
pub fn api_rate_limiter() -> Result<RateLimiterLayer, RateLimitConfigError> {
    limiter("api", 1, 50)
}

/// Both limiter classes, built once at startup.
#[derive(Clone)]
pub struct RateLimiters {
    pub checkout: RateLimiterLayer,
    pub api: RateLimiterLayer,
}

impl RateLimiters {
    /// Build the standard limiters.
    ///
    /// # Errors
    ///
    /// Returns an error if governor rejects a quota.
    pub fn standard() -> Result<Self, RateLimitConfigError> {
        Ok(Self {
            checkout: checkout_rate_limiter()?,
            api: api_rate_limiter()?,
        })
    }
}
