//! Performance aggregation over a trade list.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use signalbot_core::types::{float, Trade};
use signalbot_core::Telemetry;
use statrs::statistics::Statistics;
use tracing::info;

/// Trades per year assumed by the Sharpe/Sortino annualisation.
const ANNUALIZATION: f64 = 252.0;

/// Aggregate statistics over a trade list, recomputed wholesale per call.
/// The default value is the empty aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_pnl: Decimal,
    pub avg_win: Decimal,
    /// Mean net PnL of losing trades (non-positive)
    pub avg_loss: Decimal,
    pub profit_factor: f64,
    /// Worst peak-to-trough decline as a fraction (non-positive)
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub final_equity: Decimal,
    /// Total return relative to initial capital, in percent
    pub return_pct: f64,
    /// Equity after each trade
    pub equity_curve: Vec<Decimal>,
}

impl Metrics {
    pub fn is_empty(&self) -> bool {
        self.total_trades == 0
    }
}

/// Computes [`Metrics`] from trades in simulation order.
#[derive(Debug, Clone)]
pub struct PerformanceAnalyzer {
    initial_capital: Decimal,
    telemetry: Telemetry,
}

impl PerformanceAnalyzer {
    pub fn new(initial_capital: Decimal, telemetry: Telemetry) -> Self {
        Self {
            initial_capital,
            telemetry,
        }
    }

    pub fn initial_capital(&self) -> Decimal {
        self.initial_capital
    }

    pub fn analyze(&self, trades: &[Trade]) -> Metrics {
        if trades.is_empty() {
            return Metrics::default();
        }

        let total_trades = trades.len();
        let wins: Vec<Decimal> = trades.iter().filter(|t| t.is_win()).map(|t| t.net_pnl).collect();
        let losses: Vec<Decimal> = trades.iter().filter(|t| t.is_loss()).map(|t| t.net_pnl).collect();

        let total_pnl: Decimal = trades.iter().map(|t| t.net_pnl).sum();
        let avg_win = mean(&wins);
        let avg_loss = mean(&losses);

        let profit_factor = if losses.is_empty() || avg_loss.is_zero() {
            0.0
        } else {
            let won = avg_win * Decimal::from(wins.len());
            let lost = avg_loss * Decimal::from(losses.len());
            won.checked_div(lost).map(|r| float(r.abs())).unwrap_or(0.0)
        };

        let equity_curve = self.equity_curve(trades);
        let returns = step_returns(&equity_curve);
        let sharpe_ratio = annualized_ratio(&returns, &returns);
        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let sortino_ratio = annualized_ratio(&returns, &downside);

        let final_equity = equity_curve.last().copied().unwrap_or(self.initial_capital);
        let return_pct = final_equity
            .checked_div(self.initial_capital)
            .map(|r| float((r - Decimal::ONE) * dec!(100)))
            .unwrap_or(0.0);

        let metrics = Metrics {
            total_trades,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate: wins.len() as f64 / total_trades as f64,
            total_pnl,
            avg_win,
            avg_loss,
            profit_factor,
            max_drawdown: max_drawdown(&equity_curve),
            sharpe_ratio,
            sortino_ratio,
            final_equity,
            return_pct,
            equity_curve,
        };

        info!(
            parent: self.telemetry.span(),
            trades = total_trades,
            win_rate = metrics.win_rate,
            total_pnl = %metrics.total_pnl,
            sharpe = metrics.sharpe_ratio,
            "Performance"
        );

        metrics
    }

    /// Initial capital plus cumulative net PnL, one point per trade.
    pub fn equity_curve(&self, trades: &[Trade]) -> Vec<Decimal> {
        trades
            .iter()
            .scan(self.initial_capital, |equity, t| {
                *equity += t.net_pnl;
                Some(*equity)
            })
            .collect()
    }
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}

/// Percentage change between consecutive equity points. Computed in decimal
/// so equal steps give identical floats.
fn step_returns(equity: &[Decimal]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| (w[1] - w[0]).checked_div(w[0]).map(float).unwrap_or(0.0))
        .collect()
}

/// `sqrt(252) * mean(returns) / sample_std(dispersion)`, 0 with fewer than
/// two returns or a zero/undefined deviation.
fn annualized_ratio(returns: &[f64], dispersion: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = dispersion.std_dev();
    if !std.is_finite() || std <= 0.0 {
        return 0.0;
    }
    ANNUALIZATION.sqrt() * returns.mean() / std
}

/// Minimum of `(equity - running_peak) / running_peak`.
fn max_drawdown(equity: &[Decimal]) -> f64 {
    let mut peak = Decimal::MIN;
    equity
        .iter()
        .map(|e| {
            peak = peak.max(*e);
            if peak <= Decimal::ZERO {
                0.0
            } else {
                float((*e - peak) / peak)
            }
        })
        .fold(0.0, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalbot_core::types::{ExitReason, SignalType, Timeframe};

    fn trade(net: Decimal) -> Trade {
        Trade {
            symbol: "BTC/USDT".into(),
            signal_type: SignalType::Long,
            entry_price: 100.0,
            exit_price: 100.0,
            exit_reason: ExitReason::WindowClose,
            position_size: dec!(1),
            gross_pnl: net,
            costs: Decimal::ZERO,
            net_pnl: net,
            return_pct: 0.0,
            timestamp: 0,
            timeframe: Timeframe::Hour4,
        }
    }

    fn analyzer() -> PerformanceAnalyzer {
        PerformanceAnalyzer::new(dec!(10000), Telemetry::disabled())
    }

    #[test]
    fn test_empty_is_default() {
        let metrics = analyzer().analyze(&[]);
        assert!(metrics.is_empty());
        assert_eq!(metrics, Metrics::default());
        assert_eq!(metrics.final_equity, Decimal::ZERO);
    }

    #[test]
    fn test_counts_and_averages() {
        let trades: Vec<Trade> = [dec!(200), dec!(-100), dec!(0), dec!(400), dec!(-50)]
            .into_iter()
            .map(trade)
            .collect();
        let m = analyzer().analyze(&trades);

        assert_eq!(m.total_trades, 5);
        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 2);
        assert!((m.win_rate - 0.4).abs() < 1e-12);
        assert_eq!(m.total_pnl, dec!(450));
        assert_eq!(m.avg_win, dec!(300));
        assert_eq!(m.avg_loss, dec!(-75));
        // |300 * 2 / (-75 * 2)|
        assert!((m.profit_factor - 4.0).abs() < 1e-12);
        assert_eq!(m.final_equity, dec!(10450));
        assert!((m.return_pct - 4.5).abs() < 1e-12);
        assert_eq!(m.equity_curve.len(), 5);
    }

    #[test]
    fn test_no_losers_zero_profit_factor() {
        let m = analyzer().analyze(&[trade(dec!(10)), trade(dec!(20))]);
        assert_eq!(m.profit_factor, 0.0);
        assert_eq!(m.avg_loss, Decimal::ZERO);
        assert_eq!(m.max_drawdown, 0.0);
    }

    #[test]
    fn test_drawdown_from_running_peak() {
        let trades: Vec<Trade> = [dec!(1000), dec!(-2200), dec!(500)]
            .into_iter()
            .map(trade)
            .collect();
        let m = analyzer().analyze(&trades);
        // Peak 11000, trough 8800
        assert!((m.max_drawdown + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_sharpe_needs_two_returns() {
        let m = analyzer().analyze(&[trade(dec!(100)), trade(dec!(-40))]);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.sortino_ratio, 0.0);
    }

    #[test]
    fn test_zero_variance_returns() {
        // Breakeven every step
        let flat: Vec<Trade> = (0..5).map(|_| trade(Decimal::ZERO)).collect();
        assert_eq!(analyzer().analyze(&flat).sharpe_ratio, 0.0);

        // Constant 10% growth: 10000 -> 11000 -> 12100 -> 13310
        let compounding: Vec<Trade> = [dec!(1000), dec!(1100), dec!(1210)]
            .into_iter()
            .map(trade)
            .collect();
        let m = analyzer().analyze(&compounding);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.sortino_ratio, 0.0);
    }

    #[test]
    fn test_sharpe_and_sortino_values() {
        let points = [dec!(10100), dec!(9999), dec!(10300), dec!(10000), dec!(10250)];
        let mut previous = dec!(10000);
        let trades: Vec<Trade> = points
            .iter()
            .map(|p| {
                let t = trade(*p - previous);
                previous = *p;
                t
            })
            .collect();
        let m = analyzer().analyze(&trades);

        let equity: Vec<f64> = points.iter().map(|p| float(*p)).collect();
        let returns: Vec<f64> = equity.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let mean = returns.iter().mean();

        let expected_sharpe = 252f64.sqrt() * mean / returns.iter().std_dev();
        let expected_sortino = 252f64.sqrt() * mean / downside.iter().std_dev();
        assert!((m.sharpe_ratio - expected_sharpe).abs() < 1e-9);
        assert!((m.sortino_ratio - expected_sortino).abs() < 1e-9);
        assert!(m.sortino_ratio != 0.0);
    }
}
