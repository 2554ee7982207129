//! Configuration structures.

use serde::{Deserialize, Serialize};
use signalbot_backtest::BacktestConfig;
use signalbot_core::{SignalBotError, Telemetry};
use signalbot_indicators::IndicatorConfig;
use signalbot_monitor::{LogOptions, TelegramConfig};
use signalbot_risk::RiskConfig;
use signalbot_strategies::{CrossoverSignalGenerator, SignalConfig, SignalEngineConfig};
use std::path::PathBuf;

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LogOptions,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub pipeline: SignalEngineConfig,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub signals: SignalConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<TelegramConfig>,
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "signalbot".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Where candles come from and where signals go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Root of `<exchange>/<SYMBOL>_<tf>.csv` files
    pub dir: PathBuf,
    pub exchange: String,
    pub symbol: String,
    /// Candles fetched per timeframe
    pub limit: usize,
    /// JSON-lines file receiving confirmed signals
    pub signal_log: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            exchange: "binance".to_string(),
            symbol: "BTC/USDT".to_string(),
            limit: 100,
            signal_log: PathBuf::from("data/signals.jsonl"),
        }
    }
}

impl AppConfig {
    /// Check every section and the rules that span sections.
    pub fn validate(&self) -> Result<(), SignalBotError> {
        self.indicators.validate()?;
        self.signals.validate()?;
        self.pipeline.validate()?;
        self.risk.validate()?;
        self.backtest.validate()?;

        if self.data.exchange.is_empty() || self.data.symbol.is_empty() {
            return Err(SignalBotError::Config(
                "data.exchange and data.symbol are required".into(),
            ));
        }

        if let Some(telegram) = &self.telegram {
            if telegram.bot_token.is_empty() || telegram.chat_id.is_empty() {
                return Err(SignalBotError::Config(
                    "telegram.bot_token and telegram.chat_id are required when [telegram] is set"
                        .into(),
                ));
            }
        }
        Ok(())
    }

    /// Settings that are valid but cannot produce a signal. A short fetch
    /// degrades to "no signal", so these are reported rather than rejected.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Ok(generator) = CrossoverSignalGenerator::new(
            self.signals.clone(),
            self.indicators.clone(),
            Telemetry::disabled(),
        ) {
            let warmup = generator.warmup_period();
            if self.data.limit < warmup {
                warnings.push(format!(
                    "data.limit {} is below the {} candles the indicators need; no signal can fire",
                    self.data.limit, warmup
                ));
            }
        }
        warnings
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, SignalBotError> {
        toml::to_string_pretty(self).map_err(|e| SignalBotError::Serialization(e.to_string()))
    }
}
