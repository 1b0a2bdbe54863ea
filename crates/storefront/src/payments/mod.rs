//! Payment provider: hosted payments collected online.
//!
//! Payments are created at Mollie with the order total and the order id and
//! key as metadata. The provider notifies the storefront through a webhook
//! that carries only the payment id; the current status is always re-read
//! from the provider.

mod mollie;
mod types;

pub use mollie::MollieClient;
pub use types::*;

use async_trait::async_trait;
use haardhout_core::PaymentId;
use thiserror::Error;

/// Errors that can occur when interacting with the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Payment not found.
    #[error("Payment not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Creates and reads payments at the payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a payment and return it with its hosted checkout URL.
    async fn create_payment(&self, payment: NewPayment) -> Result<Payment, PaymentError>;

    /// Read the current state of a payment.
    async fn get_payment(&self, id: &PaymentId) -> Result<Payment, PaymentError>;
}
