//! Indicator trait definitions.

use crate::error::IndicatorError;
use crate::types::Candle;

/// A technical indicator over a single input column (usually closes).
///
/// `calculate` returns one value per input point from the first point where
/// the indicator is defined, so the last output always describes the last
/// input.
pub trait Indicator: Send + Sync {
    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<f64>;

    /// Minimum number of points before the first value exists.
    fn period(&self) -> usize;

    fn name(&self) -> &str;

    /// Validate that there's enough data.
    fn validate_data(&self, data: &[f64]) -> Result<(), IndicatorError> {
        if data.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: data.len(),
            });
        }
        Ok(())
    }
}

/// An indicator that needs whole candles (e.g. ATR uses high, low and close).
pub trait CandleIndicator: Send + Sync {
    fn calculate(&self, candles: &[Candle]) -> Vec<f64>;

    fn period(&self) -> usize;

    fn name(&self) -> &str;

    fn validate_data(&self, candles: &[Candle]) -> Result<(), IndicatorError> {
        if candles.len() < self.period() {
            return Err(IndicatorError::InsufficientData {
                required: self.period(),
                available: candles.len(),
            });
        }
        Ok(())
    }
}
