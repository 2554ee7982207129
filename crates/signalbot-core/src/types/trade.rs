//! Simulated trades.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{SignalType, Timeframe};

/// Why a simulated trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Target touched
    Target,
    /// Stop touched
    Stop,
    /// Neither level touched; closed at the last candle of the window
    WindowClose,
    /// Empty window; closed at entry
    NoData,
}

/// Outcome of one simulated signal. Never mutated after settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub signal_type: SignalType,
    pub entry_price: f64,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub position_size: Decimal,
    pub gross_pnl: Decimal,
    /// Entry plus exit transaction costs
    pub costs: Decimal,
    pub net_pnl: Decimal,
    /// Net PnL as a percentage of entry notional
    pub return_pct: f64,
    pub timestamp: i64,
    pub timeframe: Timeframe,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.net_pnl > Decimal::ZERO
    }

    pub fn is_loss(&self) -> bool {
        self.net_pnl < Decimal::ZERO
    }
}
