//! Quote a delivery price.

use haardhout_core::{ShippingQuote, compute_shipping_price};
use serde::Serialize;

use super::CommandError;

#[derive(Serialize)]
struct QuoteOutput<'a> {
    postal_code: &'a str,
    volume: f64,
    #[serde(flatten)]
    quote: ShippingQuote,
}

/// Price a delivery and print it.
///
/// # Errors
///
/// Returns [`CommandError::Unsupported`] when no rate applies.
#[allow(clippy::print_stdout)]
pub fn run(postal_code: &str, volume: f64, json: bool) -> Result<(), CommandError> {
    let quote = compute_shipping_price(postal_code, volume).ok_or_else(|| {
        CommandError::Unsupported {
            postal_code: postal_code.to_string(),
            volume,
        }
    })?;
    tracing::debug!(postal_code, volume, price = %quote.price, "Quoted");

    if json {
        let output = QuoteOutput {
            postal_code,
            volume,
            quote,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", describe(postal_code, volume, &quote));
    }
    Ok(())
}

fn describe(postal_code: &str, volume: f64, quote: &ShippingQuote) -> String {
    let zone = if quote.is_fixed {
        " (fixed-rate zone)"
    } else {
        ""
    };
    format!("{postal_code}, {volume} m³: EUR {}{zone}", quote.price)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_regular_quote() {
        let quote = compute_shipping_price("1015CS", 2.0).unwrap();
        assert_eq!(describe("1015CS", 2.0, &quote), "1015CS, 2 m³: EUR 81.42");
    }

    #[test]
    fn test_describe_fixed_quote() {
        let quote = compute_shipping_price("3811AB", 5.0).unwrap();
        assert_eq!(
            describe("3811AB", 5.0, &quote),
            "3811AB, 5 m³: EUR 45.00 (fixed-rate zone)"
        );
    }

    #[test]
    fn test_unsupported_is_an_error() {
        let err = run("8881AA", 1.0, false).unwrap_err();
        assert!(matches!(err, CommandError::Unsupported { .. }));
    }
}
