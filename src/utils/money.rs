//! Money calculation utilities using rust_decimal for precision
//!
//! All price arithmetic is done with `Decimal` internally, then converted
//! back to `f64` for storage and serialization.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert an f64 price into a Decimal for internal math
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert a Decimal back to f64, rounded for storage
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Line total: unit price at purchase time multiplied by quantity
#[inline]
pub fn line_total(unit_price: f64, quantity: i64) -> Decimal {
    to_decimal(unit_price) * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_precision() {
        // 0.1 + 0.2 style float drift must not leak into totals
        let total = line_total(19.99, 3);
        assert_eq!(to_f64(total), 59.97);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        let value = to_decimal(10.005);
        assert_eq!(to_f64(value), 10.01);

        let value = to_decimal(10.004);
        assert_eq!(to_f64(value), 10.0);
    }

    #[test]
    fn test_sum_of_lines() {
        let mut total = Decimal::ZERO;
        total += line_total(0.1, 1);
        total += line_total(0.2, 1);
        assert_eq!(to_f64(total), 0.3);
    }
}
