//! Backtest report and notification channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signalbot_core::error::NotifyError;
use signalbot_core::types::{Signal, Trade};
use signalbot_core::TelemetrySnapshot;

use crate::{BacktestMode, Metrics};

/// Result of one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub symbol: String,
    pub mode: BacktestMode,
    /// Sized signals that were simulated
    pub signals: Vec<Signal>,
    /// Confirmed signals dropped by the confirmation, trend or risk filters
    pub rejected: usize,
    pub trades: Vec<Trade>,
    pub metrics: Metrics,
    pub telemetry: TelemetrySnapshot,
}

/// The `{signals, trades, metrics}` result object.
#[derive(Serialize)]
struct ResultObject<'a> {
    signals: &'a [Signal],
    trades: &'a [Trade],
    metrics: &'a Metrics,
}

impl BacktestReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let m = &self.metrics;
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str(&format!("  Symbol:              {}\n", self.symbol));
        s.push_str(&format!("  Mode:                {}\n", self.mode));
        s.push_str(&format!(
            "  Signals:             {} simulated, {} rejected\n\n",
            self.signals.len(),
            self.rejected
        ));

        if m.is_empty() {
            s.push_str("  No trades.\n\n");
        } else {
            s.push_str("PERFORMANCE\n");
            s.push_str("───────────────────────────────────────────────────────────\n");
            s.push_str(&format!("  Final Equity:        ${:.2}\n", m.final_equity));
            s.push_str(&format!("  Total PnL:           ${:.2}\n", m.total_pnl));
            s.push_str(&format!("  Total Return:        {:.2}%\n", m.return_pct));
            s.push_str(&format!(
                "  Max Drawdown:        {:.2}%\n",
                m.max_drawdown * 100.0
            ));
            s.push('\n');

            s.push_str("RISK METRICS\n");
            s.push_str("───────────────────────────────────────────────────────────\n");
            s.push_str(&format!("  Sharpe Ratio:        {:.2}\n", m.sharpe_ratio));
            s.push_str(&format!("  Sortino Ratio:       {:.2}\n", m.sortino_ratio));
            s.push_str(&format!("  Profit Factor:       {:.2}\n", m.profit_factor));
            s.push('\n');

            s.push_str("TRADE STATISTICS\n");
            s.push_str("───────────────────────────────────────────────────────────\n");
            s.push_str(&format!("  Total Trades:        {}\n", m.total_trades));
            s.push_str(&format!("  Winning Trades:      {}\n", m.winning_trades));
            s.push_str(&format!("  Losing Trades:       {}\n", m.losing_trades));
            s.push_str(&format!("  Win Rate:            {:.2}%\n", m.win_rate * 100.0));
            s.push_str(&format!("  Avg Win:             ${:.2}\n", m.avg_win));
            s.push_str(&format!("  Avg Loss:            ${:.2}\n", m.avg_loss));
            s.push('\n');
        }

        for signal in &self.signals {
            s.push_str(&format!("  {signal}\n"));
        }

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s
    }

    /// Export the `{signals, trades, metrics}` object as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&ResultObject {
            signals: &self.signals,
            trades: &self.trades,
            metrics: &self.metrics,
        })
    }
}

/// Destination for finished reports. Formatting is the channel's concern.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn publish(&self, report: &BacktestReport) -> Result<(), NotifyError>;

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn report(metrics: Metrics) -> BacktestReport {
        BacktestReport {
            symbol: "BTC/USDT".into(),
            mode: BacktestMode::Latest,
            signals: vec![],
            rejected: 2,
            trades: vec![],
            metrics,
            telemetry: TelemetrySnapshot::default(),
        }
    }

    #[test]
    fn test_report_summary() {
        let metrics = Metrics {
            total_trades: 10,
            final_equity: dec!(11000),
            return_pct: 10.0,
            ..Default::default()
        };
        let summary = report(metrics).summary();
        assert!(summary.contains("Total Return"));
        assert!(summary.contains("10.00%"));
        assert!(summary.contains("0 simulated, 2 rejected"));
    }

    #[test]
    fn test_empty_summary() {
        assert!(report(Metrics::default()).summary().contains("No trades."));
    }

    #[test]
    fn test_json_result_object() {
        let json = report(Metrics::default()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 3);
        assert!(value["signals"].as_array().unwrap().is_empty());
        assert_eq!(value["metrics"]["total_trades"], 0);
    }
}
