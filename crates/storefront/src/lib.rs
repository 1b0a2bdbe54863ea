//! Haardhout storefront library.
//!
//! The checkout API for the Haardhout firewood webshop: shipping quotes,
//! order creation in the commerce backend, online payments, payment
//! webhooks and order status polling. Exposed as a library so the router can
//! be tested against in-memory backends.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commerce;
pub mod config;
pub mod error;
pub mod middleware;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware::from_fn, routing::get};

use crate::state::AppState;

/// Assemble the application around a set of API routes.
///
/// Adds the health check, security headers and request IDs. Tracing and
/// Sentry layers are added by the binary.
pub fn app(state: AppState, api: Router<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check upstream services.
async fn health() -> &'static str {
    "ok"
}
