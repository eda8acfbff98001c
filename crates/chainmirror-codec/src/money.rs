//! Fixed-point monetary strings.
//!
//! Persisted amounts are 8-decimal strings over integer unit counts, so
//! records never accumulate binary float drift. One coin is 1e8 units.

use crate::error::CodecError;

/// Units per whole coin.
pub const UNITS_PER_COIN: i128 = 100_000_000;

/// Renders a signed unit count as an 8-decimal string.
pub fn format_units(units: i128) -> String {
    let sign = if units < 0 { "-" } else { "" };
    let abs = units.unsigned_abs();
    format!(
        "{sign}{}.{:08}",
        abs / UNITS_PER_COIN as u128,
        abs % UNITS_PER_COIN as u128
    )
}

/// Parses an 8-decimal string back into units.
///
/// Accepts integer-only strings; fractional parts longer than 8 digits are
/// rejected rather than rounded.
pub fn parse_units(value: &str) -> Result<i128, CodecError> {
    let bad = |reason: &str| CodecError::Money {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() {
        return Err(bad("missing integer part"));
    }
    if frac_part.len() > 8 {
        return Err(bad("more than 8 decimal places"));
    }

    let int: i128 = int_part.parse().map_err(|_| bad("non-digit integer part"))?;
    let frac: i128 = if frac_part.is_empty() {
        0
    } else {
        let padded = format!("{frac_part:0<8}");
        padded.parse().map_err(|_| bad("non-digit fraction"))?
    };

    let units = int
        .checked_mul(UNITS_PER_COIN)
        .and_then(|n| n.checked_add(frac))
        .ok_or_else(|| bad("amount out of range"))?;
    Ok(if negative { -units } else { units })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_eight_decimals() {
        assert_eq!(format_units(0), "0.00000000");
        assert_eq!(format_units(1_250_000_000), "12.50000000");
        assert_eq!(format_units(-10_000), "-0.00010000");
        assert_eq!(format_units(1), "0.00000001");
    }

    #[test]
    fn parses_what_it_formats() {
        for units in [0i128, 1, -1, 10_000, -10_000, 1_250_000_000, -987_654_321] {
            assert_eq!(parse_units(&format_units(units)).unwrap(), units);
        }
    }

    #[test]
    fn parses_bare_integers_and_short_fractions() {
        assert_eq!(parse_units("10").unwrap(), 10 * UNITS_PER_COIN);
        assert_eq!(parse_units("10.5").unwrap(), 1_050_000_000);
        assert_eq!(parse_units("-3").unwrap(), -3 * UNITS_PER_COIN);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_units("").is_err());
        assert!(parse_units(".5").is_err());
        assert!(parse_units("1.123456789").is_err());
        assert!(parse_units("ten").is_err());
        assert!(parse_units("1.2x").is_err());
    }
}
