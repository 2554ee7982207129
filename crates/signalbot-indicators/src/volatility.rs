//! Volatility indicators.

use signalbot_core::error::IndicatorError;
use signalbot_core::traits::CandleIndicator;
use signalbot_core::types::Candle;

use crate::moving_average::{check_period, wilder_smooth};

/// Average True Range (ATR) with Wilder smoothing.
///
/// The first candle's true range is its high-low range, so `period` candles
/// are enough for the first value.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    /// Common period is 14.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("ATR", period)?;
        Ok(Self { period })
    }

    /// Latest value, if there are enough candles.
    pub fn last(&self, candles: &[Candle]) -> Option<f64> {
        self.calculate(candles).last().copied()
    }
}

impl CandleIndicator for Atr {
    fn calculate(&self, candles: &[Candle]) -> Vec<f64> {
        if candles.len() < self.period {
            return vec![];
        }

        let true_ranges: Vec<f64> = candles
            .iter()
            .enumerate()
            .map(|(i, c)| c.true_range(i.checked_sub(1).map(|p| candles[p].close)))
            .collect();

        wilder_smooth(&true_ranges, self.period)
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "ATR"
    }
}
