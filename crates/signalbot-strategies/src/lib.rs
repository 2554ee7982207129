//! Signal generation for the pipeline.
//!
//! - [`CrossoverSignalGenerator`]: EMA crossover confirmed by RSI extremity
//! - [`Predictor`]: rule-based or model-backed wrapper around the generator
//! - [`ConfirmationAggregator`]: merges per-timeframe candidates
//! - [`TrendFilter`]: optional long-horizon EMA filter
//! - [`SignalEngine`]: composes the above over multi-timeframe data

pub mod confirmation;
pub mod crossover;
pub mod engine;
pub mod predictor;
pub mod trend;

pub use confirmation::ConfirmationAggregator;
pub use crossover::{CrossoverSignalGenerator, SignalConfig};
pub use engine::{Evaluation, SignalEngine, SignalEngineConfig};
pub use predictor::{
    build_predictor, LearnedPredictor, Predictor, PredictorKind, ProbabilityModel,
    RuleBasedPredictor,
};
pub use trend::{TrendFilter, TrendFilterConfig};
