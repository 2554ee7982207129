//! EMA crossover signal generator.
//!
//! Fires when the fast EMA crosses the slow EMA on the last candle while RSI
//! is beyond its threshold in the same direction: a bullish cross below the
//! oversold level is LONG, a bearish cross above the overbought level SHORT.

use serde::{Deserialize, Serialize};
use signalbot_core::error::StrategyError;
use signalbot_core::types::{CandleSeries, Signal, SignalType};
use signalbot_core::{PipelineEvent, Telemetry};
use signalbot_indicators::{IndicatorConfig, IndicatorEngine};
use tracing::{debug, info};

/// Configuration for the crossover rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// LONG requires RSI below this level
    pub rsi_oversold: f64,
    /// SHORT requires RSI above this level
    pub rsi_overbought: f64,
    /// Initial stop distance in ATRs
    pub stop_atr_multiple: f64,
    /// Initial target distance in ATRs
    pub target_atr_multiple: f64,
    /// Confidence at zero distance past the threshold
    pub base_confidence: f64,
    /// Confidence cap
    pub max_confidence: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            stop_atr_multiple: 2.0,
            target_atr_multiple: 3.0,
            base_confidence: 0.6,
            max_confidence: 0.95,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if !(0.0..=100.0).contains(&self.rsi_oversold)
            || !(0.0..=100.0).contains(&self.rsi_overbought)
        {
            return Err(StrategyError::InvalidConfig(
                "RSI thresholds must be within 0-100".into(),
            ));
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(StrategyError::InvalidConfig(
                "rsi_oversold must be below rsi_overbought".into(),
            ));
        }
        if self.stop_atr_multiple <= 0.0 || self.target_atr_multiple <= 0.0 {
            return Err(StrategyError::InvalidConfig(
                "ATR multiples must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.base_confidence)
            || !(0.0..=1.0).contains(&self.max_confidence)
            || self.base_confidence > self.max_confidence
        {
            return Err(StrategyError::InvalidConfig(
                "Confidence bounds must satisfy 0 <= base <= max <= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Crossover signal generator for a single timeframe.
#[derive(Debug, Clone)]
pub struct CrossoverSignalGenerator {
    config: SignalConfig,
    engine: IndicatorEngine,
    telemetry: Telemetry,
}

impl CrossoverSignalGenerator {
    pub fn new(
        config: SignalConfig,
        indicators: IndicatorConfig,
        telemetry: Telemetry,
    ) -> Result<Self, StrategyError> {
        config.validate()?;
        let engine = IndicatorEngine::new(indicators)
            .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            config,
            engine,
            telemetry,
        })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn indicator_config(&self) -> &IndicatorConfig {
        self.engine.config()
    }

    /// Candles needed for indicator values on the last two candles.
    pub fn warmup_period(&self) -> usize {
        self.engine
            .required_candles()
            .max(self.engine.config().ema_slow + 1)
    }

    /// Evaluate the rule on the last candle. Short series and missing
    /// crossovers yield `None`.
    pub fn generate(&self, series: &CandleSeries) -> Option<Signal> {
        let warmup = self.warmup_period();
        if series.len() < warmup {
            debug!(
                parent: self.telemetry.span(),
                symbol = %series.symbol,
                timeframe = %series.timeframe,
                candles = series.len(),
                required = warmup,
                "Not enough candles for signal generation"
            );
            return None;
        }

        let frame = match self.engine.compute(series.candles()) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(parent: self.telemetry.span(), error = %e, "Indicator computation failed");
                return None;
            }
        };
        let now = frame.latest()?;
        let prev = frame.snapshot(1)?;

        let crossed_up = now.ema_fast > now.ema_slow && prev.ema_fast <= prev.ema_slow;
        let crossed_down = now.ema_fast < now.ema_slow && prev.ema_fast >= prev.ema_slow;

        let (signal_type, distance) = if crossed_up && now.rsi < self.config.rsi_oversold {
            (SignalType::Long, self.config.rsi_oversold - now.rsi)
        } else if crossed_down && now.rsi > self.config.rsi_overbought {
            (SignalType::Short, now.rsi - self.config.rsi_overbought)
        } else {
            return None;
        };

        let candle = series.last()?;
        let entry = candle.close;
        let direction = signal_type.direction();
        let confidence =
            (self.config.base_confidence + distance / 100.0).min(self.config.max_confidence);

        let signal = Signal::new(
            series.symbol.clone(),
            signal_type,
            entry,
            confidence,
            candle.timestamp,
            series.timeframe,
        )
        .with_levels(
            entry - direction * self.config.stop_atr_multiple * now.atr,
            entry + direction * self.config.target_atr_multiple * now.atr,
        )
        .with_indicators(now);

        info!(
            parent: self.telemetry.span(),
            symbol = %signal.symbol,
            timeframe = %signal.timeframe,
            signal_type = %signal.signal_type,
            entry = signal.entry_price,
            rsi = now.rsi,
            confidence = signal.confidence(),
            "Signal generated"
        );
        self.telemetry.record(PipelineEvent::Candidate);

        Some(signal)
    }
}
