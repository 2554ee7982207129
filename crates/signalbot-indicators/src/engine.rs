//! Indicator engine: every indicator the signal rules need, computed for one
//! candle series.

use serde::{Deserialize, Serialize};
use signalbot_core::error::IndicatorError;
use signalbot_core::traits::{CandleIndicator, Indicator};
use signalbot_core::types::{Candle, IndicatorSnapshot};

use crate::{Atr, Ema, Rsi, Sma};

/// Indicator periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub atr_period: usize,
    pub volume_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            ema_fast: 9,
            ema_slow: 21,
            atr_period: 14,
            volume_window: 20,
        }
    }
}

impl IndicatorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let periods = [
            ("rsi_period", self.rsi_period),
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("atr_period", self.atr_period),
            ("volume_window", self.volume_window),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(IndicatorError::InvalidParameter(format!(
                "{name} must be greater than 0"
            )));
        }
        if self.ema_fast >= self.ema_slow {
            return Err(IndicatorError::InvalidParameter(
                "ema_fast must be less than ema_slow".to_string(),
            ));
        }
        Ok(())
    }
}

/// Right-aligned indicator columns for a candle series: the last element of
/// every column describes the last candle.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    pub rsi: Vec<f64>,
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub atr: Vec<f64>,
    pub volume_sma: Vec<f64>,
    pub volume: Vec<f64>,
}

fn back_from_end(column: &[f64], back: usize) -> Option<f64> {
    column.len().checked_sub(back + 1).map(|i| column[i])
}

impl IndicatorFrame {
    /// Snapshot for the candle `back` positions before the last one.
    pub fn snapshot(&self, back: usize) -> Option<IndicatorSnapshot> {
        Some(IndicatorSnapshot {
            rsi: back_from_end(&self.rsi, back)?,
            ema_fast: back_from_end(&self.ema_fast, back)?,
            ema_slow: back_from_end(&self.ema_slow, back)?,
            atr: back_from_end(&self.atr, back)?,
            volume_sma: back_from_end(&self.volume_sma, back)?,
            volume: back_from_end(&self.volume, back)?,
        })
    }

    /// Snapshot for the last candle.
    pub fn latest(&self) -> Option<IndicatorSnapshot> {
        self.snapshot(0)
    }
}

/// Computes RSI, fast/slow EMA, ATR and volume SMA for a candle series.
///
/// Pure: the output depends only on the candles and the configuration.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
    rsi: Rsi,
    ema_fast: Ema,
    ema_slow: Ema,
    atr: Atr,
    volume_sma: Sma,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        Ok(Self {
            rsi: Rsi::new(config.rsi_period)?,
            ema_fast: Ema::new(config.ema_fast)?,
            ema_slow: Ema::new(config.ema_slow)?,
            atr: Atr::new(config.atr_period)?,
            volume_sma: Sma::new(config.volume_window)?,
            config,
        })
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Candles needed before every indicator has a value.
    pub fn required_candles(&self) -> usize {
        [
            Indicator::period(&self.rsi),
            Indicator::period(&self.ema_fast),
            Indicator::period(&self.ema_slow),
            CandleIndicator::period(&self.atr),
            Indicator::period(&self.volume_sma),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Compute every indicator column.
    pub fn compute(&self, candles: &[Candle]) -> Result<IndicatorFrame, IndicatorError> {
        let required = self.required_candles();
        if candles.len() < required {
            return Err(IndicatorError::InsufficientData {
                required,
                available: candles.len(),
            });
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volume: Vec<f64> = candles.iter().map(|c| c.volume).collect();

        Ok(IndicatorFrame {
            rsi: self.rsi.calculate(&closes),
            ema_fast: self.ema_fast.calculate(&closes),
            ema_slow: self.ema_slow.calculate(&closes),
            atr: self.atr.calculate(candles),
            volume_sma: self.volume_sma.calculate(&volume),
            volume,
        })
    }

    /// Snapshot for the last candle.
    pub fn snapshot(&self, candles: &[Candle]) -> Result<IndicatorSnapshot, IndicatorError> {
        let frame = self.compute(candles)?;
        frame.latest().ok_or(IndicatorError::InsufficientData {
            required: self.required_candles(),
            available: candles.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(i as i64 * 300, c, c + 0.5, c - 0.5, c, 100.0 + i as f64))
            .collect()
    }

    #[test]
    fn test_config_validation() {
        assert!(IndicatorConfig::default().validate().is_ok());

        let crossed = IndicatorConfig {
            ema_fast: 21,
            ema_slow: 9,
            ..Default::default()
        };
        assert!(crossed.validate().is_err());

        let zero = IndicatorConfig {
            atr_period: 0,
            ..Default::default()
        };
        assert!(IndicatorEngine::new(zero).is_err());
    }

    #[test]
    fn test_required_candles_defaults() {
        let engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
        // EMA(21) dominates RSI(14) + 1, ATR(14) and volume SMA(20).
        assert_eq!(engine.required_candles(), 21);
    }

    #[test]
    fn test_insufficient_data_is_an_error_not_a_panic() {
        let engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
        let result = engine.compute(&series(&[100.0; 20]));
        assert_eq!(
            result,
            Err(IndicatorError::InsufficientData {
                required: 21,
                available: 20
            })
        );
        assert!(engine.snapshot(&[]).is_err());
    }

    #[test]
    fn test_snapshot_describes_last_candle() {
        let engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let candles = series(&closes);

        let frame = engine.compute(&candles).unwrap();
        let latest = frame.latest().unwrap();
        assert_eq!(latest.volume, 139.0);
        assert_eq!(latest.rsi, 100.0);
        // Each step gaps 1.0 above the previous close: true range 1.5.
        assert!((latest.atr - 1.5).abs() < 0.01);
        assert!(latest.ema_fast > latest.ema_slow);

        let previous = frame.snapshot(1).unwrap();
        assert_eq!(previous.volume, 138.0);
        assert!(previous.ema_fast < latest.ema_fast);

        assert!(frame.snapshot(40).is_none());
    }

    #[test]
    fn test_deterministic() {
        let engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.3).cos()).collect();
        let candles = series(&closes);
        assert_eq!(engine.compute(&candles), engine.compute(&candles));
    }
}
