//! Technical indicators for the signal pipeline.
//!
//! - Moving averages (SMA, EMA)
//! - Momentum (Wilder RSI)
//! - Volatility (Wilder ATR over candles)
//! - [`IndicatorEngine`], which computes all of them for one candle series

pub mod engine;
pub mod momentum;
pub mod moving_average;
pub mod volatility;

pub use engine::{IndicatorConfig, IndicatorEngine, IndicatorFrame};
pub use momentum::Rsi;
pub use moving_average::{Ema, Sma};
pub use volatility::Atr;
