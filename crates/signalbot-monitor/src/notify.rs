//! Report notification channels.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use signalbot_backtest::{BacktestReport, NotificationChannel};
use signalbot_core::error::NotifyError;
use std::time::Duration;
use tracing::{info, warn};

/// Markdown message for a report.
pub fn format_message(report: &BacktestReport) -> String {
    let m = &report.metrics;
    let mut s = format!("*📊 Backtest Results - {}*\n\n", report.symbol);

    if m.is_empty() {
        s.push_str("❌ No signals generated in backtest\n");
        s.push_str(&format!("Rejected: {}\n", report.rejected));
        return s;
    }

    s.push_str("*Performance:*\n");
    s.push_str(&format!("• Total Trades: {}\n", m.total_trades));
    s.push_str(&format!("• Win Rate: {:.1}%\n", m.win_rate * 100.0));
    s.push_str(&format!("• Total PnL: ${:.2}\n", m.total_pnl));
    s.push_str(&format!("• Return: {:.2}%\n", m.return_pct));

    s.push_str("\n*Risk Metrics:*\n");
    s.push_str(&format!("• Sharpe Ratio: {:.2}\n", m.sharpe_ratio));
    s.push_str(&format!("• Sortino Ratio: {:.2}\n", m.sortino_ratio));
    s.push_str(&format!("• Max Drawdown: {:.1}%\n", m.max_drawdown * 100.0));
    s.push_str(&format!("• Profit Factor: {:.2}\n", m.profit_factor));

    s.push_str("\n*Trade Stats:*\n");
    s.push_str(&format!("• Avg Win: ${:.2}\n", m.avg_win));
    s.push_str(&format!("• Avg Loss: ${:.2}\n", m.avg_loss));
    s.push_str(&format!("• Final Equity: ${:.2}\n", m.final_equity));

    if let Some(signal) = report.signals.last() {
        s.push_str("\n*Latest Signal:*\n");
        s.push_str(&format!(
            "• {} {} @ {:.4} (SL {:.4}, TP {:.4}, confidence {:.0}%)\n",
            signal.signal_type,
            signal.timeframe,
            signal.entry_price,
            signal.stop(),
            signal.target(),
            signal.confidence() * 100.0
        ));
    }
    s
}

/// Writes reports to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl NotificationChannel for LogNotifier {
    async fn publish(&self, report: &BacktestReport) -> Result<(), NotifyError> {
        let m = &report.metrics;
        info!(
            symbol = %report.symbol,
            signals = report.signals.len(),
            rejected = report.rejected,
            trades = m.total_trades,
            win_rate = m.win_rate,
            total_pnl = %m.total_pnl,
            sharpe = m.sharpe_ratio,
            "Backtest report"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: "https://api.telegram.org".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends reports to a Telegram chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        if config.bot_token.is_empty() || config.chat_id.is_empty() {
            return Err(NotifyError::NotConfigured(
                "telegram bot_token and chat_id are required".into(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }
}

#[async_trait]
impl NotificationChannel for TelegramNotifier {
    async fn publish(&self, report: &BacktestReport) -> Result<(), NotifyError> {
        let body = json!({
            "chat_id": self.config.chat_id,
            "text": format_message(report),
            "parse_mode": "Markdown",
        });

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.without_url().to_string()))?;

        let status = response.status();
        let api: ApiResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Delivery(format!("HTTP {}: {}", status, e.without_url())))?;

        if !status.is_success() || !api.ok {
            let reason = api.description.unwrap_or_else(|| status.to_string());
            warn!(chat_id = %self.config.chat_id, reason = %reason, "Telegram rejected message");
            return Err(NotifyError::Delivery(reason));
        }

        info!(symbol = %report.symbol, "Report sent to Telegram");
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
