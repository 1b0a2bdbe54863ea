//! Haardhout Core - Shared types and shipping pricing.
//!
//! This crate provides the pieces used across all Haardhout components:
//! - `storefront` - Checkout API, payment webhooks and order polling
//! - `cli` - Operator tools for quoting shipping prices
//!
//! # Architecture
//!
//! The core crate contains only types, pure functions and static data - no I/O,
//! no HTTP clients. This keeps it lightweight and allows the pricing engine to
//! be reused by every caller that needs a quote.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, postal codes and statuses
//! - [`shipping`] - Shipping cost pricing engine and rate tables

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod shipping;
pub mod types;

pub use shipping::{RateCard, ShippingQuote, compute_shipping_price};
pub use types::*;
