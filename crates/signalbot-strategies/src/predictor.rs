//! Pluggable signal predictors.
//!
//! Both variants run the crossover rule. They differ in where the signal's
//! `probability` comes from: the rule confidence, or an injected model.

use serde::{Deserialize, Serialize};
use signalbot_core::error::StrategyError;
use signalbot_core::types::{CandleSeries, Signal};
use signalbot_core::Telemetry;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::CrossoverSignalGenerator;

/// Produces at most one candidate signal for a single-timeframe series.
pub trait Predictor: Send + Sync {
    fn name(&self) -> &str;

    /// Candles needed before a prediction is possible.
    fn warmup_period(&self) -> usize;

    fn predict(&self, series: &CandleSeries) -> Option<Signal>;
}

/// Estimates the success probability of a rule-generated signal.
pub trait ProbabilityModel: Send + Sync {
    fn name(&self) -> &str;

    fn probability(&self, signal: &Signal, series: &CandleSeries) -> Result<f64, StrategyError>;
}

/// Which predictor the pipeline runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    #[default]
    RuleBased,
    Learned,
}

impl fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictorKind::RuleBased => write!(f, "rule_based"),
            PredictorKind::Learned => write!(f, "learned"),
        }
    }
}

/// The crossover rule on its own; probability equals confidence.
#[derive(Debug, Clone)]
pub struct RuleBasedPredictor {
    generator: CrossoverSignalGenerator,
}

impl RuleBasedPredictor {
    pub fn new(generator: CrossoverSignalGenerator) -> Self {
        Self { generator }
    }
}

impl Predictor for RuleBasedPredictor {
    fn name(&self) -> &str {
        "rule_based"
    }

    fn warmup_period(&self) -> usize {
        self.generator.warmup_period()
    }

    fn predict(&self, series: &CandleSeries) -> Option<Signal> {
        let mut signal = self.generator.generate(series)?;
        signal.set_probability(signal.confidence());
        Some(signal)
    }
}

/// The crossover rule scored by a probability model.
pub struct LearnedPredictor {
    generator: CrossoverSignalGenerator,
    model: Arc<dyn ProbabilityModel>,
    telemetry: Telemetry,
}

impl LearnedPredictor {
    pub fn new(
        generator: CrossoverSignalGenerator,
        model: Arc<dyn ProbabilityModel>,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            generator,
            model,
            telemetry,
        }
    }
}

impl Predictor for LearnedPredictor {
    fn name(&self) -> &str {
        "learned"
    }

    fn warmup_period(&self) -> usize {
        self.generator.warmup_period()
    }

    fn predict(&self, series: &CandleSeries) -> Option<Signal> {
        let mut signal = self.generator.generate(series)?;
        match self.model.probability(&signal, series) {
            Ok(p) => signal.set_probability(p),
            Err(e) => {
                warn!(
                    parent: self.telemetry.span(),
                    model = self.model.name(),
                    error = %e,
                    "Model failed, using rule confidence"
                );
                signal.set_probability(signal.confidence());
            }
        }
        Some(signal)
    }
}

/// Build the configured predictor. `Learned` needs a model.
pub fn build_predictor(
    kind: PredictorKind,
    generator: CrossoverSignalGenerator,
    model: Option<Arc<dyn ProbabilityModel>>,
    telemetry: Telemetry,
) -> Result<Box<dyn Predictor>, StrategyError> {
    match (kind, model) {
        (PredictorKind::RuleBased, _) => Ok(Box::new(RuleBasedPredictor::new(generator))),
        (PredictorKind::Learned, Some(model)) => {
            Ok(Box::new(LearnedPredictor::new(generator, model, telemetry)))
        }
        (PredictorKind::Learned, None) => Err(StrategyError::InvalidConfig(
            "learned predictor requires a probability model".into(),
        )),
    }
}
