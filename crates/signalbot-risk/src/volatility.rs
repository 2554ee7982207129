//! ATR-based stop and target placement.

use signalbot_core::error::IndicatorError;
use signalbot_core::types::{Candle, Signal};
use signalbot_indicators::Atr;

/// Re-derives stop and target from the current ATR:
/// stop at `multiplier` ATRs, target at `multiplier * target_ratio` ATRs.
#[derive(Debug, Clone)]
pub struct VolatilityAdjuster {
    atr: Atr,
    multiplier: f64,
    target_ratio: f64,
}

impl VolatilityAdjuster {
    pub fn new(atr_period: usize, multiplier: f64, target_ratio: f64) -> Result<Self, IndicatorError> {
        Ok(Self {
            atr: Atr::new(atr_period)?,
            multiplier,
            target_ratio,
        })
    }

    /// Overwrite the signal's levels. Leaves the signal untouched when there
    /// is not enough history for an ATR.
    pub fn adjust(&self, mut signal: Signal, candles: &[Candle]) -> Signal {
        let Some(atr) = self.atr.last(candles) else {
            return signal;
        };

        let direction = signal.signal_type.direction();
        let stop_distance = atr * self.multiplier;
        let target_distance = stop_distance * self.target_ratio;
        signal.stop_loss = Some(signal.entry_price - direction * stop_distance);
        signal.target_price = Some(signal.entry_price + direction * target_distance);
        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalbot_core::types::{SignalType, Timeframe};

    fn candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle::new(i as i64 * 60, 100.0, 101.0, 99.0, 100.0, 1.0))
            .collect()
    }

    fn signal(signal_type: SignalType) -> Signal {
        Signal::new("X", signal_type, 100.0, 0.7, 0, Timeframe::Hour1).with_levels(1.0, 2.0)
    }

    #[test]
    fn test_adjusts_levels_from_atr() {
        let adjuster = VolatilityAdjuster::new(14, 2.0, 1.5).unwrap();

        let long = adjuster.adjust(signal(SignalType::Long), &candles(20));
        assert!((long.stop() - 96.0).abs() < 1e-9);
        assert!((long.target() - 106.0).abs() < 1e-9);

        let short = adjuster.adjust(signal(SignalType::Short), &candles(20));
        assert!((short.stop() - 104.0).abs() < 1e-9);
        assert!((short.target() - 94.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_history_is_noop() {
        let adjuster = VolatilityAdjuster::new(14, 2.0, 1.5).unwrap();
        let unchanged = adjuster.adjust(signal(SignalType::Long), &candles(13));
        assert_eq!(unchanged, signal(SignalType::Long));
    }
}
