//! Business logic services for storefront.
//!
//! # Services
//!
//! - `checkout` - Order creation, payment start, webhooks and retries
//! - `validation` - Checkout form validation
//! - `tracking` - Server-side conversion tracking (Meta Conversions API)
//! - `address` - Address autocomplete (PDOK locatieserver)

pub mod address;
pub mod checkout;
pub mod tracking;
pub mod validation;

pub use address::{AddressLookup, AddressLookupError, AddressSuggestion};
pub use checkout::{
    CartLine, CheckoutError, CheckoutOutcome, CheckoutRequest, CheckoutService, CustomerInput,
    OrderDetails, OrderStatusSummary, WebhookOutcome,
};
pub use tracking::{ConversionSink, ConversionTracker, PurchaseEvent, TrackingError};
pub use validation::FieldErrors;
