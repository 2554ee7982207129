//! Trading signals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Timeframe;

/// Trade direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    Long,
    Short,
}

impl SignalType {
    /// +1 for long, -1 for short.
    #[inline]
    pub fn direction(&self) -> f64 {
        match self {
            SignalType::Long => 1.0,
            SignalType::Short => -1.0,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            SignalType::Long => SignalType::Short,
            SignalType::Short => SignalType::Long,
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalType::Long => write!(f, "LONG"),
            SignalType::Short => write!(f, "SHORT"),
        }
    }
}

/// Indicator values for the candle a signal was generated on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub atr: f64,
    pub volume_sma: f64,
    pub volume: f64,
}

/// Clamp a ratio into [0, 1]; NaN becomes 0.
fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A trading signal.
///
/// Created by a predictor on one timeframe, enriched by confirmation and the
/// risk filter. The ratio fields are private so they stay within [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub signal_type: SignalType,
    pub entry_price: f64,
    /// Missing means "at entry", which yields zero risk downstream.
    pub stop_loss: Option<f64>,
    pub target_price: Option<f64>,
    confidence: f64,
    /// Open time of the candle the signal fired on (Unix seconds)
    pub timestamp: i64,
    pub timeframe: Timeframe,
    pub indicators: IndicatorSnapshot,
    confirmation_score: f64,
    avg_confidence: f64,
    pub confirmed_timeframes: u32,
    pub position_size: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    probability: Option<f64>,
}

impl Signal {
    /// Create an unconfirmed, unsized signal without stop or target.
    pub fn new(
        symbol: impl Into<String>,
        signal_type: SignalType,
        entry_price: f64,
        confidence: f64,
        timestamp: i64,
        timeframe: Timeframe,
    ) -> Self {
        let confidence = unit(confidence);
        Self {
            symbol: symbol.into(),
            signal_type,
            entry_price,
            stop_loss: None,
            target_price: None,
            confidence,
            timestamp,
            timeframe,
            indicators: IndicatorSnapshot::default(),
            confirmation_score: 0.0,
            avg_confidence: confidence,
            confirmed_timeframes: 1,
            position_size: Decimal::ZERO,
            probability: None,
        }
    }

    /// Set stop and target.
    pub fn with_levels(mut self, stop_loss: f64, target_price: f64) -> Self {
        self.stop_loss = Some(stop_loss);
        self.target_price = Some(target_price);
        self
    }

    pub fn with_indicators(mut self, indicators: IndicatorSnapshot) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn is_long(&self) -> bool {
        self.signal_type == SignalType::Long
    }

    /// Effective stop price.
    pub fn stop(&self) -> f64 {
        self.stop_loss.unwrap_or(self.entry_price)
    }

    /// Effective target price.
    pub fn target(&self) -> f64 {
        self.target_price.unwrap_or(self.entry_price)
    }

    /// Distance from entry to stop on the losing side. Non-positive when the
    /// stop sits on the wrong side of entry.
    pub fn risk_per_unit(&self) -> f64 {
        (self.entry_price - self.stop()) * self.signal_type.direction()
    }

    /// Distance from entry to target on the winning side.
    pub fn reward_per_unit(&self) -> f64 {
        (self.target() - self.entry_price) * self.signal_type.direction()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = unit(confidence);
    }

    pub fn confirmation_score(&self) -> f64 {
        self.confirmation_score
    }

    pub fn set_confirmation_score(&mut self, score: f64) {
        self.confirmation_score = unit(score);
    }

    /// Mean confidence of the primary and confirming timeframes.
    pub fn avg_confidence(&self) -> f64 {
        self.avg_confidence
    }

    pub fn set_avg_confidence(&mut self, avg: f64) {
        self.avg_confidence = unit(avg);
    }

    /// Model-estimated success probability, if a predictor supplied one.
    pub fn probability(&self) -> Option<f64> {
        self.probability
    }

    pub fn set_probability(&mut self, probability: f64) {
        self.probability = Some(unit(probability));
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {:.4} [{}] stop {:.4} target {:.4} conf {:.2} score {:.2}",
            self.signal_type,
            self.symbol,
            self.entry_price,
            self.timeframe,
            self.stop(),
            self.target(),
            self.confidence,
            self.confirmation_score
        )
    }
}
