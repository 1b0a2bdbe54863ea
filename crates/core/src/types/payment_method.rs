//! Payment method selected at checkout.

use serde::{Deserialize, Serialize};

/// How the customer settles an order.
///
/// On the wire the storefront UI sends the legacy identifiers `ideal` and
/// `cod`; the descriptive names are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Pay immediately through the payment provider's hosted page (iDEAL).
    #[serde(rename = "ideal", alias = "pay-online")]
    PayOnline,
    /// Pay the driver at delivery; no online payment is created.
    #[serde(rename = "cod", alias = "pay-on-delivery")]
    PayOnDelivery,
}

impl PaymentMethod {
    /// Identifier stored on the order in the commerce backend.
    #[must_use]
    pub const fn backend_id(&self) -> &'static str {
        match self {
            Self::PayOnline => "ideal",
            Self::PayOnDelivery => "cod",
        }
    }

    /// Customer-facing title stored alongside the identifier.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::PayOnline => "iDEAL",
            Self::PayOnDelivery => "Betalen bij levering",
        }
    }

    /// Whether this method requires a payment at the provider.
    #[must_use]
    pub const fn requires_online_payment(&self) -> bool {
        match self {
            Self::PayOnline => true,
            Self::PayOnDelivery => false,
        }
    }

    /// Map a backend identifier back to a method.
    #[must_use]
    pub fn from_backend_id(id: &str) -> Option<Self> {
        match id {
            "ideal" | "mollie_wc_gateway_ideal" => Some(Self::PayOnline),
            "cod" => Some(Self::PayOnDelivery),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_and_aliases() {
        let online: PaymentMethod = serde_json::from_str("\"ideal\"").unwrap();
        let online_alias: PaymentMethod = serde_json::from_str("\"pay-online\"").unwrap();
        let cod: PaymentMethod = serde_json::from_str("\"cod\"").unwrap();
        let cod_alias: PaymentMethod = serde_json::from_str("\"pay-on-delivery\"").unwrap();

        assert_eq!(online, PaymentMethod::PayOnline);
        assert_eq!(online_alias, PaymentMethod::PayOnline);
        assert_eq!(cod, PaymentMethod::PayOnDelivery);
        assert_eq!(cod_alias, PaymentMethod::PayOnDelivery);
        assert!(serde_json::from_str::<PaymentMethod>("\"paypal\"").is_err());
    }

    #[test]
    fn test_serializes_to_legacy_ids() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::PayOnDelivery).unwrap(),
            "\"cod\""
        );
    }

    #[test]
    fn test_backend_id_roundtrip() {
        for method in [PaymentMethod::PayOnline, PaymentMethod::PayOnDelivery] {
            assert_eq!(PaymentMethod::from_backend_id(method.backend_id()), Some(method));
        }
        assert_eq!(PaymentMethod::from_backend_id("bacs"), None);
    }
}
