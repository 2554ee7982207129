//! Deterministic trade simulation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use signalbot_core::error::StrategyError;
use signalbot_core::types::{decimal, float, Candle, ExitReason, Signal, SignalType, Trade};
use signalbot_core::{PipelineEvent, Telemetry};
use tracing::debug;

/// Per-leg transaction costs as fractions of notional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    pub commission: Decimal,
    pub slippage: Decimal,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            commission: dec!(0.001),
            slippage: dec!(0.0005),
        }
    }
}

impl CostModel {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.commission < Decimal::ZERO || self.slippage < Decimal::ZERO {
            return Err(StrategyError::InvalidConfig(
                "Commission and slippage must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Cost of one leg at `price` for `size` units.
    pub fn leg_cost(&self, price: f64, size: Decimal) -> Decimal {
        decimal(price) * size * (self.commission + self.slippage)
    }
}

/// Where and why a trade left the market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitFill {
    pub price: f64,
    pub reason: ExitReason,
}

/// Replays candles after a signal to settle it as a trade.
#[derive(Debug, Clone)]
pub struct TradeSimulator {
    costs: CostModel,
    telemetry: Telemetry,
}

impl TradeSimulator {
    pub fn new(costs: CostModel, telemetry: Telemetry) -> Self {
        Self { costs, telemetry }
    }

    pub fn costs(&self) -> &CostModel {
        &self.costs
    }

    /// First touch of target or stop, scanning chronologically. Within one
    /// candle the target is checked first. Untouched: last close. Empty
    /// window: entry.
    pub fn exit(&self, signal: &Signal, window: &[Candle]) -> ExitFill {
        let target = signal.target();
        let stop = signal.stop();

        for candle in window {
            let (hit_target, hit_stop) = match signal.signal_type {
                SignalType::Long => (candle.high >= target, candle.low <= stop),
                SignalType::Short => (candle.low <= target, candle.high >= stop),
            };
            if hit_target {
                return ExitFill {
                    price: target,
                    reason: ExitReason::Target,
                };
            }
            if hit_stop {
                return ExitFill {
                    price: stop,
                    reason: ExitReason::Stop,
                };
            }
        }

        match window.last() {
            Some(last) => ExitFill {
                price: last.close,
                reason: ExitReason::WindowClose,
            },
            None => ExitFill {
                price: signal.entry_price,
                reason: ExitReason::NoData,
            },
        }
    }

    /// Trade economics for a sized signal and its exit.
    pub fn settle(&self, signal: &Signal, fill: &ExitFill) -> Trade {
        let size = signal.position_size;
        let entry = decimal(signal.entry_price);
        let exit = decimal(fill.price);

        let gross_pnl = match signal.signal_type {
            SignalType::Long => (exit - entry) * size,
            SignalType::Short => (entry - exit) * size,
        };
        let costs = self.costs.leg_cost(signal.entry_price, size)
            + self.costs.leg_cost(fill.price, size);
        let net_pnl = gross_pnl - costs;

        let notional = entry * size;
        let return_pct = if notional.is_zero() {
            0.0
        } else {
            net_pnl
                .checked_div(notional)
                .map(|r| float(r * dec!(100)))
                .unwrap_or(0.0)
        };

        debug!(
            parent: self.telemetry.span(),
            symbol = %signal.symbol,
            signal_type = %signal.signal_type,
            entry = signal.entry_price,
            exit = fill.price,
            reason = ?fill.reason,
            net_pnl = %net_pnl,
            "Trade settled"
        );
        self.telemetry.record(PipelineEvent::TradeSimulated);

        Trade {
            symbol: signal.symbol.clone(),
            signal_type: signal.signal_type,
            entry_price: signal.entry_price,
            exit_price: fill.price,
            exit_reason: fill.reason,
            position_size: size,
            gross_pnl,
            costs,
            net_pnl,
            return_pct,
            timestamp: signal.timestamp,
            timeframe: signal.timeframe,
        }
    }

    /// `exit` then `settle`.
    pub fn simulate(&self, signal: &Signal, window: &[Candle]) -> Trade {
        let fill = self.exit(signal, window);
        self.settle(signal, &fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalbot_core::types::Timeframe;

    fn candle(high: f64, low: f64, close: f64) -> Candle {
        Candle::new(0, close, high, low, close, 1.0)
    }

    fn signal(signal_type: SignalType, stop: f64, target: f64, size: Decimal) -> Signal {
        let mut s = Signal::new("BTC/USDT", signal_type, 100.0, 0.7, 0, Timeframe::Hour4)
            .with_levels(stop, target);
        s.position_size = size;
        s
    }

    fn simulator() -> TradeSimulator {
        TradeSimulator::new(CostModel::default(), Telemetry::disabled())
    }

    #[test]
    fn test_target_checked_before_stop() {
        let s = signal(SignalType::Long, 90.0, 110.0, dec!(1));
        let fill = simulator().exit(&s, &[candle(111.0, 95.0, 100.0)]);
        assert_eq!(fill.price, 110.0);
        assert_eq!(fill.reason, ExitReason::Target);

        // Both touched in one candle
        let fill = simulator().exit(&s, &[candle(111.0, 89.0, 100.0)]);
        assert_eq!(fill.price, 110.0);
    }

    #[test]
    fn test_short_mirror() {
        let s = signal(SignalType::Short, 110.0, 90.0, dec!(1));
        let window = [candle(105.0, 95.0, 100.0), candle(111.0, 99.0, 108.0)];
        let fill = simulator().exit(&s, &window);
        assert_eq!(fill.price, 110.0);
        assert_eq!(fill.reason, ExitReason::Stop);
    }

    #[test]
    fn test_untouched_exits_at_last_close() {
        let s = signal(SignalType::Long, 90.0, 110.0, dec!(1));
        let window = [candle(105.0, 95.0, 101.0), candle(106.0, 97.0, 103.5)];
        let fill = simulator().exit(&s, &window);
        assert_eq!(fill.price, 103.5);
        assert_eq!(fill.reason, ExitReason::WindowClose);
    }

    #[test]
    fn test_empty_window_exits_at_entry() {
        let s = signal(SignalType::Long, 90.0, 110.0, dec!(3));
        let trade = simulator().simulate(&s, &[]);
        assert_eq!(trade.exit_price, trade.entry_price);
        assert_eq!(trade.exit_reason, ExitReason::NoData);
        assert_eq!(trade.gross_pnl, Decimal::ZERO);
        // Both legs still pay costs.
        assert_eq!(trade.costs, dec!(0.9));
        assert!(trade.is_loss());
    }

    #[test]
    fn test_economics() {
        let s = signal(SignalType::Long, 90.0, 110.0, dec!(10));
        let trade = simulator().simulate(&s, &[candle(111.0, 95.0, 100.0)]);

        assert_eq!(trade.gross_pnl, dec!(100));
        // (100 + 110) * 10 * 0.0015
        assert_eq!(trade.costs, dec!(3.15));
        assert_eq!(trade.net_pnl, dec!(96.85));
        assert!((trade.return_pct - 9.685).abs() < 1e-9);

        let mut short = s.clone();
        short.signal_type = SignalType::Short;
        let fill = ExitFill {
            price: 95.0,
            reason: ExitReason::Target,
        };
        assert_eq!(simulator().settle(&short, &fill).gross_pnl, dec!(50));
    }

    #[test]
    fn test_zero_size_zero_return() {
        let s = signal(SignalType::Long, 90.0, 110.0, Decimal::ZERO);
        let trade = simulator().simulate(&s, &[candle(111.0, 95.0, 100.0)]);
        assert_eq!(trade.return_pct, 0.0);
        assert_eq!(trade.net_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_trade_counted() {
        let telemetry = Telemetry::disabled();
        let sim = TradeSimulator::new(CostModel::default(), telemetry.clone());
        sim.simulate(&signal(SignalType::Long, 90.0, 110.0, dec!(1)), &[]);
        assert_eq!(telemetry.snapshot().trades, 1);
    }
}
