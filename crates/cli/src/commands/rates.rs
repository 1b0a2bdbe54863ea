//! Print the rate card.

use haardhout_core::RateCard;
use rust_decimal::Decimal;

use super::CommandError;

/// Print every region's rates, optionally with the price of `volume`.
///
/// # Errors
///
/// Returns [`CommandError::InvalidVolume`] for volumes below one unit.
#[allow(clippy::print_stdout)]
pub fn run(volume: Option<f64>) -> Result<(), CommandError> {
    if let Some(v) = volume
        && !(v.is_finite() && v >= 1.0)
    {
        return Err(CommandError::InvalidVolume(v));
    }

    for line in render(&RateCard::STANDARD, volume) {
        println!("{line}");
    }
    Ok(())
}

fn render(card: &RateCard, volume: Option<f64>) -> Vec<String> {
    let mut lines = vec![format!(
        "Fixed-rate zone ({} prefixes): EUR {:.2}",
        card.fixed_rate_prefixes.len(),
        card.flat_amount
    )];
    lines.push(format!("  {}", card.fixed_rate_prefixes.join(" ")));
    lines.push(String::new());

    let header = match volume {
        Some(v) => format!("prefix  base      surcharge  {v} m³"),
        None => "prefix  base      surcharge".to_string(),
    };
    lines.push(header);

    for rate in card.rates {
        let mut line = format!(
            "{:<6}  {:>8.2}  {:>8.0}%",
            rate.prefix,
            rate.base_price,
            rate.surcharge_rate * 100.0
        );
        if let Some(v) = volume {
            // Any four-digit code outside the fixed zone prices like its region
            let price = card
                .quote(&format!("{}00", rate.prefix), v)
                .map_or(Decimal::ZERO, |q| q.price);
            line.push_str(&format!("  {:>8}", price.to_string()));
        }
        lines.push(line);
    }
    lines
}
