//! Core types and traits for the signal pipeline.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Candle, CandleSeries, MultiTimeframeData)
//! - Signals, indicator snapshots and simulated trades
//! - The telemetry handle injected into every pipeline component
//! - Collaborator traits for market data, persistence and indicators

pub mod error;
pub mod telemetry;
pub mod traits;
pub mod types;

pub use error::SignalBotError;
pub use telemetry::{PipelineEvent, Telemetry, TelemetrySnapshot};
pub use traits::*;
pub use types::*;
