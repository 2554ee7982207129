//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use signalbot_backtest::BacktestMode;
use signalbot_config::AppConfig;
use signalbot_core::types::Timeframe;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "signalbot")]
#[command(author, version, about = "Multi-timeframe crypto signal generation and backtesting")]
pub struct Cli {
    /// Configuration file path. Without one, defaults plus SIGNALBOT__*
    /// environment overrides are used.
    #[arg(short, long, env = "SIGNALBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the configuration)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the signal pipeline over historical candles
    Backtest(BacktestArgs),
    /// Evaluate the latest candles, store any confirmed signal and notify
    Scan(ScanArgs),
    /// Print or write the default configuration
    InitConfig(InitConfigArgs),
    /// Validate configuration
    ValidateConfig,
}

/// Where candles come from. Unset flags fall back to the configuration.
#[derive(clap::Args)]
pub struct SourceArgs {
    /// Trading pair, e.g. BTC/USDT
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Exchange directory under the data root
    #[arg(short, long)]
    pub exchange: Option<String>,

    /// Confirmation timeframes (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub timeframes: Vec<Timeframe>,

    /// Candles fetched per timeframe
    #[arg(long)]
    pub limit: Option<usize>,

    /// Data directory holding <exchange>/<SYMBOL>_<tf>.csv files
    #[arg(long)]
    pub data: Option<PathBuf>,
}

impl SourceArgs {
    /// Fold the flags into the configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(symbol) = &self.symbol {
            config.data.symbol = symbol.clone();
        }
        if let Some(exchange) = &self.exchange {
            config.data.exchange = exchange.clone();
        }
        if !self.timeframes.is_empty() {
            config.pipeline.timeframes = self.timeframes.clone();
        }
        if let Some(limit) = self.limit {
            config.data.limit = limit;
        }
        if let Some(dir) = &self.data {
            config.data.dir = dir.clone();
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Latest,
    WalkForward,
}

impl From<ModeArg> for BacktestMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Latest => BacktestMode::Latest,
            ModeArg::WalkForward => BacktestMode::WalkForward,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Backtest mode
    #[arg(short, long)]
    pub mode: Option<ModeArg>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,

    /// Save the JSON result object to file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Publish the report to the configured notification channels
    #[arg(long)]
    pub notify: bool,
}

#[derive(clap::Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Skip writing confirmed signals to the signal log
    #[arg(long)]
    pub no_store: bool,

    /// Skip notification channels
    #[arg(long)]
    pub no_notify: bool,
}

#[derive(clap::Args)]
pub struct InitConfigArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_backtest_flags() {
        let cli = Cli::parse_from([
            "signalbot",
            "backtest",
            "--symbol",
            "ETH/USDT",
            "--timeframes",
            "15m,1h,4h",
            "--mode",
            "walk-forward",
            "--output",
            "json",
        ]);
        let Commands::Backtest(args) = cli.command else {
            panic!("expected backtest");
        };
        assert_eq!(
            args.source.timeframes,
            vec![Timeframe::Minute15, Timeframe::Hour1, Timeframe::Hour4]
        );
        assert!(args.output == OutputFormat::Json);
        assert_eq!(
            BacktestMode::from(args.mode.unwrap()),
            BacktestMode::WalkForward
        );

        let mut config = AppConfig::default();
        args.source.apply(&mut config);
        assert_eq!(config.data.symbol, "ETH/USDT");
        assert_eq!(config.data.exchange, "binance");
        assert_eq!(config.pipeline.timeframes.len(), 3);
    }

    #[test]
    fn test_bad_timeframe_rejected() {
        assert!(Cli::try_parse_from(["signalbot", "scan", "--timeframes", "7m"]).is_err());
    }
}
