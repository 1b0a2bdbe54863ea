//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a euro price.
    #[must_use]
    pub const fn eur(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::EUR)
    }

    /// Create a price from an amount in minor units (cents).
    #[must_use]
    pub fn from_cents(cents: i64, currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::new(cents, 2), currency_code)
    }

    /// Parse a decimal amount as returned by REST APIs (e.g. `"123.45"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a decimal number.
    pub fn parse(amount: &str, currency_code: CurrencyCode) -> Result<Self, rust_decimal::Error> {
        Decimal::from_str(amount.trim()).map(|amount| Self::new(amount, currency_code))
    }

    /// Amount rounded to cents, half away from zero.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Amount formatted with exactly two decimals and a dot separator.
    ///
    /// This is the wire format payment providers and the commerce backend
    /// expect (`"81.42"`, `"45.00"`).
    #[must_use]
    pub fn to_api_string(&self) -> String {
        format!("{:.2}", self.rounded())
    }

    /// Format for display to Dutch customers (e.g. `€ 81,42`).
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{} {}",
            self.currency_code.symbol(),
            self.to_api_string().replace('.', ",")
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EUR,
    USD,
    GBP,
}

impl CurrencyCode {
    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::EUR => "€",
            Self::USD => "$",
            Self::GBP => "£",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EUR => "EUR",
            Self::USD => "USD",
            Self::GBP => "GBP",
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Self::EUR),
            "USD" => Ok(Self::USD),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_string_has_two_decimals() {
        assert_eq!(Price::from_cents(4500, CurrencyCode::EUR).to_api_string(), "45.00");
        assert_eq!(Price::eur(Decimal::new(8142, 2)).to_api_string(), "81.42");
        assert_eq!(Price::eur(Decimal::from(7)).to_api_string(), "7.00");
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        let price = Price::eur(Decimal::new(92_595, 3));
        assert_eq!(price.to_api_string(), "92.60");
    }

    #[test]
    fn test_display_uses_dutch_separator() {
        assert_eq!(Price::from_cents(8142, CurrencyCode::EUR).display(), "€ 81,42");
    }

    #[test]
    fn test_parse() {
        let price = Price::parse(" 123.45 ", CurrencyCode::EUR).unwrap();
        assert_eq!(price.amount, Decimal::new(12345, 2));
        assert!(Price::parse("twelve", CurrencyCode::EUR).is_err());
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), CurrencyCode::EUR);
        assert!("JPY".parse::<CurrencyCode>().is_err());
    }
}
