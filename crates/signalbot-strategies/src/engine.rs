//! Signal engine: predictor per timeframe, confirmation, then filters.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use signalbot_core::error::StrategyError;
use signalbot_core::types::{MultiTimeframeData, Signal, Timeframe};
use signalbot_core::{PipelineEvent, Telemetry};
use std::collections::BTreeMap;
use tracing::info;

use crate::{ConfirmationAggregator, Predictor, PredictorKind, TrendFilter, TrendFilterConfig};

/// Pipeline-level signal settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalEngineConfig {
    /// Confirmation ladder; the highest is primary
    pub timeframes: Vec<Timeframe>,
    /// Confirmed signals scoring below this are dropped
    pub min_confirmation_score: f64,
    pub predictor: PredictorKind,
    pub trend_filter: TrendFilterConfig,
}

impl Default for SignalEngineConfig {
    fn default() -> Self {
        Self {
            timeframes: Timeframe::default_ladder(),
            min_confirmation_score: 0.6,
            predictor: PredictorKind::RuleBased,
            trend_filter: TrendFilterConfig::default(),
        }
    }
}

impl SignalEngineConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.timeframes.is_empty() {
            return Err(StrategyError::InvalidConfig(
                "At least one timeframe required".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confirmation_score) {
            return Err(StrategyError::InvalidConfig(
                "min_confirmation_score must be within 0-1".into(),
            ));
        }
        if self.trend_filter.enabled && self.trend_filter.period == 0 {
            return Err(StrategyError::InvalidConfig(
                "Trend filter period must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Result of one pipeline evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// No primary candidate.
    NoSignal,
    /// Confirmed, but filtered out.
    Rejected { signal: Signal, reason: String },
    Confirmed(Signal),
}

impl Evaluation {
    pub fn confirmed(self) -> Option<Signal> {
        match self {
            Evaluation::Confirmed(signal) => Some(signal),
            _ => None,
        }
    }
}

/// Runs the predictor on every configured timeframe and merges the result.
pub struct SignalEngine {
    config: SignalEngineConfig,
    predictor: Box<dyn Predictor>,
    aggregator: ConfirmationAggregator,
    trend_filter: Option<TrendFilter>,
    telemetry: Telemetry,
}

impl SignalEngine {
    pub fn new(
        config: SignalEngineConfig,
        predictor: Box<dyn Predictor>,
        telemetry: Telemetry,
    ) -> Result<Self, StrategyError> {
        config.validate()?;
        let aggregator =
            ConfirmationAggregator::new(&config.timeframes, telemetry.child("confirmation"))?;
        let trend_filter = if config.trend_filter.enabled {
            Some(TrendFilter::new(
                config.trend_filter.period,
                telemetry.child("trend"),
            )?)
        } else {
            None
        };
        Ok(Self {
            config,
            predictor,
            aggregator,
            trend_filter,
            telemetry,
        })
    }

    pub fn config(&self) -> &SignalEngineConfig {
        &self.config
    }

    pub fn timeframes(&self) -> &[Timeframe] {
        self.aggregator.timeframes()
    }

    pub fn primary(&self) -> Timeframe {
        self.aggregator.primary()
    }

    pub fn warmup_period(&self) -> usize {
        self.predictor.warmup_period()
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }

    /// Candidate signal per timeframe. Timeframes are independent and run in
    /// parallel; a missing series yields no candidate.
    pub fn candidates(&self, data: &MultiTimeframeData) -> BTreeMap<Timeframe, Signal> {
        self.timeframes()
            .par_iter()
            .filter_map(|tf| {
                let series = data.get(*tf)?;
                self.predictor.predict(series).map(|s| (*tf, s))
            })
            .collect()
    }

    /// Full evaluation on one multi-timeframe snapshot.
    pub fn evaluate(&self, data: &MultiTimeframeData) -> Evaluation {
        let candidates = self.candidates(data);
        let Some(signal) = self.aggregator.aggregate(&candidates) else {
            return Evaluation::NoSignal;
        };

        if signal.confirmation_score() < self.config.min_confirmation_score {
            let reason = format!(
                "confirmation score {:.2} below minimum {:.2}",
                signal.confirmation_score(),
                self.config.min_confirmation_score
            );
            return self.reject(signal, reason);
        }

        if let Some(filter) = &self.trend_filter {
            let passes = data
                .get(self.primary())
                .map_or(true, |series| filter.passes(&signal, series));
            if !passes {
                return self.reject(signal, "signal against primary trend".to_string());
            }
        }

        info!(
            parent: self.telemetry.span(),
            symbol = %signal.symbol,
            signal_type = %signal.signal_type,
            timeframe = %signal.timeframe,
            confirmation_score = signal.confirmation_score(),
            "Signal confirmed"
        );
        self.telemetry.record(PipelineEvent::Confirmed);
        Evaluation::Confirmed(signal)
    }

    fn reject(&self, signal: Signal, reason: String) -> Evaluation {
        info!(
            parent: self.telemetry.span(),
            symbol = %signal.symbol,
            signal_type = %signal.signal_type,
            reason = %reason,
            "Signal rejected"
        );
        self.telemetry.record(PipelineEvent::Rejected);
        Evaluation::Rejected { signal, reason }
    }
}
