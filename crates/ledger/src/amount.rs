use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::{LedgerError, ResultLedger};

/// Number of fraction digits used when an amount is shown to the user.
pub const DISPLAY_SCALE: u32 = 2;

/// Parses a user-entered decimal string into an exact [`Decimal`].
///
/// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
/// Unlike display, parsing keeps every fractional digit so totals are
/// computed on the exact values and rounded once.
///
/// # Examples
///
/// ```rust
/// use ledger::parse_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_amount("10").unwrap(), Decimal::new(10, 0));
/// assert_eq!(parse_amount("10,5").unwrap(), Decimal::new(105, 1));
/// assert!(parse_amount("ten").is_err());
/// ```
pub fn parse_amount(s: &str) -> ResultLedger<Decimal> {
    let empty = || LedgerError::Validation("empty amount".to_string());
    let invalid = || LedgerError::Validation(format!("invalid amount: {}", s.trim()));

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (true, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (false, stripped)
    } else {
        (false, trimmed)
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return Err(empty());
    }

    let rest = rest.replace(',', ".");
    let mut parts = rest.split('.');
    let units = parts.next().ok_or_else(invalid)?;
    let fraction = parts.next();
    if parts.next().is_some() {
        return Err(invalid());
    }

    if units.is_empty() || !units.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if let Some(frac) = fraction
        && !frac.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let value = Decimal::from_str(rest.trim_end_matches('.')).map_err(|_| invalid())?;
    Ok(if negative { -value } else { value })
}

/// Converts a floating point value coming from the remote store.
///
/// The shortest decimal rendering of the float is used, so `10.005_f64`
/// becomes exactly `10.005`. Non-finite values are rejected.
pub fn amount_from_f64(value: f64) -> ResultLedger<Decimal> {
    if !value.is_finite() {
        return Err(LedgerError::Validation(format!(
            "amount must be finite, got {value}"
        )));
    }
    Decimal::from_str(&value.to_string())
        .map_err(|_| LedgerError::Validation(format!("amount out of range: {value}")))
}

/// Converts an amount to the floating point representation the remote store
/// keeps.
pub fn amount_to_f64(value: Decimal) -> ResultLedger<f64> {
    value
        .to_f64()
        .ok_or_else(|| LedgerError::Validation(format!("amount out of range: {value}")))
}

/// Rounds to [`DISPLAY_SCALE`] digits, halves away from zero.
#[must_use]
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Renders an amount as a fixed-point string with two decimals.
///
/// ```rust
/// use ledger::format_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_amount(Decimal::ZERO), "0.00");
/// assert_eq!(format_amount(Decimal::new(15005, 3)), "15.01");
/// ```
#[must_use]
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round_amount(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!(parse_amount("10").unwrap(), Decimal::new(10, 0));
        assert_eq!(parse_amount("10.5").unwrap(), Decimal::new(105, 1));
        assert_eq!(parse_amount("10,50").unwrap(), Decimal::new(1050, 2));
        assert_eq!(parse_amount("-0.01").unwrap(), Decimal::new(-1, 2));
        assert_eq!(parse_amount("+1.00").unwrap(), Decimal::new(100, 2));
        assert_eq!(parse_amount("  2.30 ").unwrap(), Decimal::new(230, 2));
        assert_eq!(parse_amount("7.").unwrap(), Decimal::new(7, 0));
    }

    #[test]
    fn parse_keeps_extra_decimals() {
        assert_eq!(parse_amount("10.005").unwrap(), Decimal::new(10005, 3));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("-").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("1.2.3").is_err());
        assert!(parse_amount(".5").is_err());
        assert!(parse_amount("1e3").is_err());
    }

    #[test]
    fn float_conversion_uses_shortest_rendering() {
        assert_eq!(amount_from_f64(10.005).unwrap(), Decimal::new(10005, 3));
        assert_eq!(amount_from_f64(100.0).unwrap(), Decimal::new(100, 0));
        assert!(amount_from_f64(f64::NAN).is_err());
        assert!(amount_from_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn display_rounds_half_away_from_zero() {
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
        assert_eq!(format_amount(Decimal::new(1, 2)), "0.01");
        assert_eq!(format_amount(Decimal::new(12, 0)), "12.00");
        assert_eq!(format_amount(Decimal::new(15005, 3)), "15.01");
        assert_eq!(format_amount(Decimal::new(15004, 3)), "15.00");
    }
}
