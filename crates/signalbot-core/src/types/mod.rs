//! Core data types for the signal pipeline.

mod candle;
mod decimal;
mod signal;
mod timeframe;
mod trade;

pub use candle::{Candle, CandleRow, CandleSeries, MultiTimeframeData};
pub use decimal::{decimal, float};
pub use signal::{IndicatorSnapshot, Signal, SignalType};
pub use timeframe::Timeframe;
pub use trade::{ExitReason, Trade};
