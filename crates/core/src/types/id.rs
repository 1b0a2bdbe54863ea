//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Commerce backend ids
//! are unsigned integers; payment provider ids and order keys are opaque
//! strings and get their own wrappers below.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to define a type-safe numeric ID wrapper.
///
/// Creates a newtype wrapper around `u64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_u64()`
/// - `From<u64>`, `Into<u64>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use haardhout_core::define_id;
/// define_id!(CustomerId);
/// define_id!(InvoiceId);
///
/// let customer_id = CustomerId::new(1);
/// let invoice_id = InvoiceId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: CustomerId = invoice_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create a new ID from a u64 value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the underlying u64 value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(OrderId);
define_id!(ProductId);

/// Payment identifier assigned by the payment provider (e.g. `tr_WDqYK6vllg`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    /// Wrap a provider payment id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Secret per-order token proving the caller may view or act on an order.
///
/// There is no login system: whoever holds the key of an order owns it. The
/// `Debug` output is redacted and comparisons run in constant time.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderKey(String);

impl OrderKey {
    /// Wrap an order key issued by the commerce backend.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    ///
    /// Only use this when handing the key back to its owner (redirect URLs,
    /// checkout responses, payment metadata).
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Compare against a key presented by a caller.
    ///
    /// Runs in time independent of where the first mismatching byte is.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();
        if expected.is_empty() || expected.len() != presented.len() {
            return false;
        }
        expected
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Debug for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OrderKey([REDACTED])")
    }
}

/// Correlation id generated once per checkout submission.
///
/// Carried in the confirmation redirect and used as the conversion event id
/// so browser-side and server-side tracking can be deduplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckoutRef(Uuid);

impl CheckoutRef {
    /// Generate a fresh correlation id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for CheckoutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CheckoutRef {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::str::FromStr for CheckoutRef {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_parse_and_display() {
        let id: OrderId = " 4217 ".parse().unwrap();
        assert_eq!(id, OrderId::new(4217));
        assert_eq!(id.to_string(), "4217");
        assert!("abc".parse::<OrderId>().is_err());
    }

    #[test]
    fn test_order_id_serde_transparent() {
        let json = serde_json::to_string(&OrderId::new(12)).unwrap();
        assert_eq!(json, "12");
        let parsed: OrderId = serde_json::from_str("12").unwrap();
        assert_eq!(parsed.as_u64(), 12);
    }

    #[test]
    fn test_order_key_matches() {
        let key = OrderKey::new("wc_order_abc123");
        assert!(key.matches("wc_order_abc123"));
        assert!(!key.matches("wc_order_abc124"));
        assert!(!key.matches("wc_order_abc12"));
        assert!(!key.matches(""));
    }

    #[test]
    fn test_empty_order_key_never_matches() {
        assert!(!OrderKey::new("").matches(""));
    }

    #[test]
    fn test_order_key_debug_is_redacted() {
        let key = OrderKey::new("wc_order_super_secret");
        let debug = format!("{key:?}");
        assert!(!debug.contains("super_secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_checkout_refs_are_unique() {
        assert_ne!(CheckoutRef::generate(), CheckoutRef::generate());
    }

    #[test]
    fn test_checkout_ref_parse() {
        let original = CheckoutRef::generate();
        let parsed: CheckoutRef = original.to_string().parse().unwrap();
        assert_eq!(parsed, original);
        assert!("not-a-uuid".parse::<CheckoutRef>().is_err());
    }
}
