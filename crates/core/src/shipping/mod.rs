//! Shipping cost pricing engine.
//!
//! Maps a Dutch postal code and an ordered volume (cubic meters) to a
//! delivery price. The same function serves the cart's shipping estimate and
//! the server-side order creation, so a quoted price is always the charged
//! price.
//!
//! # Algorithm
//!
//! 1. Normalize the postal code (strip whitespace, upper-case). Fewer than four
//!    characters, or a volume below one unit, is unsupported.
//! 2. A four-digit prefix in the fixed-rate set prices at the flat amount,
//!    whatever the volume.
//! 3. Otherwise the two-digit prefix selects a [`PostalCodeRate`]; an unknown
//!    prefix is unsupported.
//! 4. The first unit costs `base_price`. The second costs
//!    `base_price * surcharge_rate * decay`, and every further unit costs
//!    `decay` times the previous one.
//! 5. The total is rounded half-up to cents.
//!
//! Unsupported is not an error: callers ask the customer to contact the shop
//! for a custom quote.

pub mod rates;

use rust_decimal::Decimal;
use serde::Serialize;

pub use rates::{
    FIXED_RATE_PREFIXES, FLAT_RATE_AMOUNT, POSTAL_CODE_RATES, PostalCodeRate, SURCHARGE_DECAY,
};

/// A computed delivery price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShippingQuote {
    /// Delivery price in euros, rounded to cents.
    pub price: Decimal,
    /// Whether the flat fixed-rate zone price applied.
    pub is_fixed: bool,
}

/// Rate tables and constants used to price a delivery.
#[derive(Debug, Clone, Copy)]
pub struct RateCard {
    /// Two-digit prefix rates, sorted by prefix.
    pub rates: &'static [PostalCodeRate],
    /// Four-digit prefixes priced at `flat_amount`.
    pub fixed_rate_prefixes: &'static [&'static str],
    /// Price for the fixed-rate zone.
    pub flat_amount: f64,
    /// Multiplier applied to each successive surcharge increment.
    pub decay: f64,
}

impl RateCard {
    /// The shop's published rate card.
    pub const STANDARD: Self = Self {
        rates: POSTAL_CODE_RATES,
        fixed_rate_prefixes: FIXED_RATE_PREFIXES,
        flat_amount: FLAT_RATE_AMOUNT,
        decay: SURCHARGE_DECAY,
    };

    /// Price a delivery of `volume_units` to `postal_code`.
    ///
    /// Returns `None` when the destination or volume cannot be priced.
    #[must_use]
    pub fn quote(&self, postal_code: &str, volume_units: f64) -> Option<ShippingQuote> {
        // NaN and infinities fall through this check as well
        if !volume_units.is_finite() || volume_units < 1.0 {
            return None;
        }

        let normalized = normalize(postal_code);
        let prefix4 = normalized.get(..4)?;

        if self.fixed_rate_prefixes.contains(&prefix4) {
            return Some(ShippingQuote {
                price: round_to_cents(self.flat_amount),
                is_fixed: true,
            });
        }

        let rate = self.rate_for(prefix4.get(..2)?)?;

        let mut total = rate.base_price;
        if volume_units > 1.0 {
            let mut extra = rate.base_price * rate.surcharge_rate;
            let mut unit = 2.0;
            while unit <= volume_units {
                extra *= self.decay;
                total += extra;
                unit += 1.0;
            }
        }

        Some(ShippingQuote {
            price: round_to_cents(total),
            is_fixed: false,
        })
    }

    /// Look up the rate for a two-digit prefix.
    #[must_use]
    pub fn rate_for(&self, prefix2: &str) -> Option<&PostalCodeRate> {
        self.rates
            .binary_search_by(|rate| rate.prefix.cmp(prefix2))
            .ok()
            .and_then(|index| self.rates.get(index))
    }

    /// Whether the postal code falls in the flat-rate zone.
    #[must_use]
    pub fn is_fixed_rate(&self, postal_code: &str) -> bool {
        normalize(postal_code)
            .get(..4)
            .is_some_and(|prefix4| self.fixed_rate_prefixes.contains(&prefix4))
    }
}

impl Default for RateCard {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Price a delivery with the standard rate card.
///
/// See the [module documentation](self) for the algorithm.
///
/// ```
/// use haardhout_core::compute_shipping_price;
///
/// let quote = compute_shipping_price("1011 AB", 2.0).unwrap();
/// assert_eq!(quote.price.to_string(), "81.42");
/// assert!(!quote.is_fixed);
///
/// assert!(compute_shipping_price("8881", 1.0).is_none());
/// ```
#[must_use]
pub fn compute_shipping_price(postal_code: &str, volume_units: f64) -> Option<ShippingQuote> {
    RateCard::STANDARD.quote(postal_code, volume_units)
}

/// Strip all whitespace and upper-case. Non-ASCII input keeps its characters
/// but can never match a prefix.
fn normalize(postal_code: &str) -> String {
    postal_code
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Round half-up to cents, matching `Math.round(total * 100) / 100`.
fn round_to_cents(amount: f64) -> Decimal {
    #[allow(clippy::cast_possible_truncation)] // delivery prices are far below i64::MAX cents
    let cents = (amount * 100.0 + 0.5).floor() as i64;
    Decimal::new(cents, 2)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(postal_code: &str, volume: f64) -> Decimal {
        compute_shipping_price(postal_code, volume).unwrap().price
    }

    fn cents(value: i64) -> Decimal {
        Decimal::new(value, 2)
    }

    #[test]
    fn test_fixed_rate_ignores_volume() {
        for volume in [1.0, 5.0, 10.0, 20.0] {
            let quote = compute_shipping_price("3811 AB", volume).unwrap();
            assert_eq!(quote.price, cents(4500));
            assert!(quote.is_fixed);
        }
    }

    #[test]
    fn test_fixed_rate_takes_priority_over_table() {
        // 38xx has a table rate, 3832 is in the fixed zone
        let fixed = compute_shipping_price("3832XK", 3.0).unwrap();
        let table = compute_shipping_price("3843XK", 3.0).unwrap();
        assert!(fixed.is_fixed);
        assert!(!table.is_fixed);
        assert_ne!(fixed.price, table.price);
    }

    #[test]
    fn test_unsupported_inputs() {
        assert!(compute_shipping_price("", 1.0).is_none());
        assert!(compute_shipping_price("101", 1.0).is_none());
        assert!(compute_shipping_price("   1 0 1  ", 1.0).is_none());
        assert!(compute_shipping_price("1011AB", 0.0).is_none());
        assert!(compute_shipping_price("1011AB", -2.0).is_none());
        assert!(compute_shipping_price("1011AB", 0.99).is_none());
        assert!(compute_shipping_price("1011AB", f64::NAN).is_none());
        assert!(compute_shipping_price("1011AB", f64::INFINITY).is_none());
        assert!(compute_shipping_price("8881AB", 1.0).is_none());
        assert!(compute_shipping_price("9999ZZ", 1.0).is_none());
        assert!(compute_shipping_price("AB12CD", 1.0).is_none());
    }

    #[test]
    fn test_fixed_zone_still_requires_valid_volume() {
        assert!(compute_shipping_price("3811AB", 0.0).is_none());
    }

    #[test]
    fn test_base_price_per_band() {
        assert_eq!(price("1011AB", 1.0), cents(6900));
        assert_eq!(price("1621AA", 1.0), cents(7900));
        assert_eq!(price("2511CV", 1.0), cents(7900));
        assert_eq!(price("3011AA", 1.0), cents(7900));
        assert_eq!(price("3511AA", 1.0), cents(5900));
        assert_eq!(price("3701AA", 1.0), cents(5500));
        assert_eq!(price("4331AA", 1.0), cents(9500));
        assert_eq!(price("5611AA", 1.0), cents(7900));
        assert_eq!(price("6211AA", 1.0), cents(9900));
        assert_eq!(price("6811AA", 1.0), cents(6500));
        assert_eq!(price("8011AA", 1.0), cents(6900));
        assert_eq!(price("9711AA", 1.0), cents(8500));
    }

    #[test]
    fn test_reference_values() {
        assert_eq!(price("1011AB", 2.0), cents(8142));
        let three = price("1011AB", 3.0);
        assert_eq!(three, cents(9260));
    }

    #[test]
    fn test_diminishing_surcharge() {
        let one = price("1011AB", 1.0);
        let two = price("1011AB", 2.0);
        let three = price("1011AB", 3.0);
        assert!(two > one);
        assert!(three > two);
        assert!(three - two < two - one);
    }

    #[test]
    fn test_surcharge_compounds_over_many_units() {
        let mut previous_step = None;
        for volume in 2..=12 {
            let step = price("5211AA", f64::from(volume)) - price("5211AA", f64::from(volume - 1));
            assert!(step > Decimal::ZERO);
            if let Some(previous) = previous_step {
                assert!(step <= previous, "step at {volume} grew");
            }
            previous_step = Some(step);
        }
    }

    #[test]
    fn test_zero_surcharge_is_stable() {
        assert_eq!(price("3701AA", 1.0), price("3701AA", 5.0));
        assert_eq!(price("3911AA", 1.0), price("3911AA", 20.0));
    }

    #[test]
    fn test_case_and_whitespace_tolerance() {
        let expected = compute_shipping_price("1011AB", 3.0);
        for input in ["1011ab", " 1011 AB ", "10 11 ab", "1011\tAb"] {
            assert_eq!(compute_shipping_price(input, 3.0), expected, "input {input:?}");
        }
        assert_eq!(
            compute_shipping_price("3811 aa", 1.0),
            compute_shipping_price("3811AA", 1.0)
        );
    }

    #[test]
    fn test_lenient_postal_code_format() {
        // Only the length is checked: malformed codes with a known prefix price normally
        assert_eq!(price("10XX", 1.0), cents(6900));
        assert_eq!(price("1011-whatever", 2.0), cents(8142));
    }

    #[test]
    fn test_fractional_volume_counts_whole_increments() {
        assert_eq!(price("1011AB", 2.5), price("1011AB", 2.0));
        assert_eq!(price("1011AB", 3.7), price("1011AB", 3.0));
        assert_eq!(price("1011AB", 1.5), price("1011AB", 1.0));
    }

    #[test]
    fn test_idempotent() {
        let first = compute_shipping_price("6511AB", 4.0);
        let second = compute_shipping_price("6511AB", 4.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_rate_card() {
        const RATES: &[PostalCodeRate] = &[PostalCodeRate {
            prefix: "12",
            base_price: 10.0,
            surcharge_rate: 0.5,
        }];
        let card = RateCard {
            rates: RATES,
            fixed_rate_prefixes: &["1234"],
            flat_amount: 1.0,
            decay: 0.5,
        };
        assert_eq!(card.quote("1234AA", 9.0).unwrap().price, cents(100));
        // 10 + 10*0.5*0.5 = 12.50
        assert_eq!(card.quote("1299AA", 2.0).unwrap().price, cents(1250));
        assert!(card.quote("1011AA", 1.0).is_none());
    }

    #[test]
    fn test_rate_lookup_and_fixed_zone() {
        let card = RateCard::STANDARD;
        let rate = card.rate_for("10").unwrap();
        assert!((rate.base_price - 69.0).abs() < f64::EPSILON);
        assert!((rate.surcharge_rate - 0.2).abs() < f64::EPSILON);
        assert!(card.rate_for("88").is_none());
        assert!(card.is_fixed_rate("3811 ab"));
        assert!(!card.is_fixed_rate("1011AB"));
        assert!(!card.is_fixed_rate("38"));
    }

    #[test]
    fn test_round_to_cents_half_up() {
        assert_eq!(round_to_cents(92.598), cents(9260));
        assert_eq!(round_to_cents(81.42), cents(8142));
        assert_eq!(round_to_cents(10.125), cents(1013));
    }

    #[test]
    fn test_quote_serializes_price_as_string() {
        let quote = compute_shipping_price("1011AB", 2.0).unwrap();
        let json = serde_json::to_value(quote).unwrap();
        assert_eq!(json, serde_json::json!({"price": "81.42", "is_fixed": false}));
    }
}
