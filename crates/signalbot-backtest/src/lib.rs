//! Backtesting for the signal pipeline.
//!
//! - [`TradeSimulator`]: replays a candle window to find the exit and settle
//!   the trade economics
//! - [`PerformanceAnalyzer`]: aggregates trades into [`Metrics`]
//! - [`Ledger`]: the sequential balance fold used for sizing
//! - [`Backtester`]: runs the whole pipeline over fetched data

mod engine;
mod ledger;
mod performance;
mod report;
mod simulator;

pub use engine::{BacktestConfig, BacktestMode, Backtester};
pub use ledger::Ledger;
pub use performance::{Metrics, PerformanceAnalyzer};
pub use report::{BacktestReport, NotificationChannel};
pub use simulator::{CostModel, ExitFill, TradeSimulator};
