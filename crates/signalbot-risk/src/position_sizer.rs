//! Fixed-fractional position sizing.

use rust_decimal::Decimal;
use signalbot_core::types::{decimal, Signal};

/// Sizes a position so that hitting the stop loses `max_risk_fraction` of
/// the balance.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    max_risk_fraction: Decimal,
}

impl PositionSizer {
    pub fn new(max_risk_fraction: Decimal) -> Self {
        Self { max_risk_fraction }
    }

    /// Units to trade; 0 when the per-unit risk is not positive.
    pub fn size(&self, signal: &Signal, balance: Decimal) -> Decimal {
        let risk_per_unit = decimal(signal.risk_per_unit());
        if risk_per_unit <= Decimal::ZERO || balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (balance * self.max_risk_fraction)
            .checked_div(risk_per_unit)
            .unwrap_or(Decimal::ZERO)
    }
}
