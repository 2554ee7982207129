//! Account balance fold over settled trades.

use rust_decimal::Decimal;
use signalbot_core::types::{Signal, Trade};

/// Balance and history threaded through a backtest in simulation order.
///
/// Each signal must be sized from the balance left by the trades before it,
/// so the backtester folds over this value rather than mutating shared state.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    balance: Decimal,
    signals: Vec<Signal>,
    trades: Vec<Trade>,
}

impl Ledger {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            balance: initial_balance,
            signals: Vec::new(),
            trades: Vec::new(),
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Book a settled trade and the sized signal it came from.
    pub fn post(mut self, signal: Signal, trade: Trade) -> Self {
        self.balance += trade.net_pnl;
        self.signals.push(signal);
        self.trades.push(trade);
        self
    }

    pub fn into_parts(self) -> (Vec<Signal>, Vec<Trade>) {
        (self.signals, self.trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use signalbot_core::types::{ExitReason, SignalType, Timeframe};

    fn settled(net: Decimal) -> (Signal, Trade) {
        let signal = Signal::new("X", SignalType::Long, 100.0, 0.7, 0, Timeframe::Hour1);
        let trade = Trade {
            symbol: "X".into(),
            signal_type: SignalType::Long,
            entry_price: 100.0,
            exit_price: 100.0,
            exit_reason: ExitReason::Target,
            position_size: dec!(1),
            gross_pnl: net,
            costs: Decimal::ZERO,
            net_pnl: net,
            return_pct: 0.0,
            timestamp: 0,
            timeframe: Timeframe::Hour1,
        };
        (signal, trade)
    }

    #[test]
    fn test_fold_tracks_balance() {
        let ledger = [dec!(150), dec!(-40), dec!(12.5)]
            .into_iter()
            .map(settled)
            .fold(Ledger::new(dec!(10000)), |ledger, (signal, trade)| {
                ledger.post(signal, trade)
            });

        assert_eq!(ledger.balance(), dec!(10122.5));
        assert_eq!(ledger.trades().len(), 3);
        assert_eq!(ledger.signals().len(), 3);
    }

    #[test]
    fn test_balances_seen_by_each_step() {
        let mut seen = Vec::new();
        [dec!(100), dec!(-300)]
            .into_iter()
            .map(settled)
            .fold(Ledger::new(dec!(1000)), |ledger, (signal, trade)| {
                seen.push(ledger.balance());
                ledger.post(signal, trade)
            });
        assert_eq!(seen, vec![dec!(1000), dec!(1100)]);
    }
}
