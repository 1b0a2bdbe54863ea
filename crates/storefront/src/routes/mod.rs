//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Health check (see main.rs)
//!
//! # Shipping
//! GET  /api/shipping/quote?postcode&volume  - Shipping quote for the cart
//!
//! # Checkout
//! POST /api/checkout                        - Submit checkout, create order
//! POST /api/webhooks/payment                - Payment provider webhook (form `id`)
//!
//! # Orders (key-gated)
//! GET  /api/orders/{id}?key                 - Order details
//! GET  /api/orders/{id}/status?key&attempt  - Status polling
//! POST /api/orders/{id}/retry-payment       - New payment for a failed order
//!
//! # Address
//! GET  /api/address/lookup?postcode&number  - Address autocomplete
//! ```
//!
//! Checkout and retry share the strict rate limiter, the read-only endpoints
//! the relaxed one. The webhook is never rate limited.

pub mod address;
pub mod checkout;
pub mod orders;
pub mod shipping;
pub mod webhook;

use axum::{
    Router,
    routing::{get, post},
};
use haardhout_core::OrderId;

use crate::error::AppError;
use crate::middleware::{RateLimitConfigError, RateLimiters};
use crate::services::checkout::PAYMENT_WEBHOOK_PATH;
use crate::state::AppState;

/// Routes that create orders or payments.
fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::submit))
        .route(
            "/orders/{id}/retry-payment",
            post(orders::retry_payment),
        )
}

/// Read-only routes: quotes, lookups and order polling.
fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/shipping/quote", get(shipping::quote))
        .route("/address/lookup", get(address::lookup))
        .route("/orders/{id}", get(orders::details))
        .route("/orders/{id}/status", get(orders::status))
}

fn build(limiters: Option<RateLimiters>) -> Router<AppState> {
    let (checkout, read) = match limiters {
        Some(limiters) => (
            checkout_routes().layer(limiters.checkout),
            read_routes().layer(limiters.api),
        ),
        None => (checkout_routes(), read_routes()),
    };

    Router::new()
        .nest("/api", checkout.merge(read))
        .route(PAYMENT_WEBHOOK_PATH, post(webhook::payment))
}

/// Create all API routes without rate limiting.
pub fn routes() -> Router<AppState> {
    build(None)
}

/// Create all API routes with the standard rate limiters.
///
/// # Errors
///
/// Returns an error if a limiter quota is rejected.
pub fn rate_limited_routes() -> Result<Router<AppState>, RateLimitConfigError> {
    Ok(build(Some(RateLimiters::standard()?)))
}

/// Parse an order id path segment. Anything unparseable is an unknown order.
fn parse_order_id(raw: &str) -> Result<OrderId, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("order {raw}")))
}
