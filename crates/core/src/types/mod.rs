//! Core types for Haardhout.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod payment_method;
pub mod polling;
pub mod postal_code;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use payment_method::PaymentMethod;
pub use polling::{PollHint, PollSchedule};
pub use postal_code::{PostalCode, PostalCodeError};
pub use price::{CurrencyCode, Price};
pub use status::*;
