//! Conversions between float prices and decimal money.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;

/// Convert a float to a decimal; non-finite or out-of-range values become 0.
pub fn decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or_default()
}

/// Convert a decimal to a float; unrepresentable values become 0.
pub fn float(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
