//! Commerce backend: products and order persistence.
//!
//! The catalog and all orders live in WooCommerce. This storefront keeps no
//! local database; every read goes to the backend, except product lookups
//! which are cached for 5 minutes.
//!
//! The orchestrator depends on the [`CommerceBackend`] trait so tests can
//! substitute an in-memory implementation.

mod types;
mod woocommerce;

pub use types::*;
pub use woocommerce::WooCommerceClient;

use async_trait::async_trait;
use haardhout_core::{OrderId, OrderStatus, PaymentId, ProductId};
use thiserror::Error;

/// Errors that can occur when interacting with the commerce backend.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Products and orders in the commerce backend.
#[async_trait]
pub trait CommerceBackend: Send + Sync {
    /// Load products by id. Unknown ids are omitted from the result.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, CommerceError>;

    /// Create an order. The backend computes line totals from its own prices.
    async fn create_order(&self, order: NewOrder) -> Result<Order, CommerceError>;

    /// Load an order. Returns [`CommerceError::NotFound`] for unknown ids.
    async fn get_order(&self, id: OrderId) -> Result<Order, CommerceError>;

    /// Persist a new order status.
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, CommerceError>;

    /// Move an order back to `pending` and clear its payment id, in one write.
    ///
    /// Until a new payment is attached, webhooks of any payment for the order
    /// are accepted.
    async fn reopen_order(&self, id: OrderId) -> Result<Order, CommerceError>;

    /// Record the payment currently collecting this order.
    async fn attach_payment(&self, id: OrderId, payment_id: &PaymentId)
    -> Result<(), CommerceError>;
}
