//! Pipeline assembly shared by the commands.

use anyhow::{Context, Result};
use signalbot_backtest::{Backtester, NotificationChannel};
use signalbot_config::AppConfig;
use signalbot_core::types::MultiTimeframeData;
use signalbot_core::{MarketDataSource, SignalStore, Telemetry};
use signalbot_data::CsvMarketData;
use signalbot_monitor::{LogNotifier, TelegramNotifier};
use signalbot_risk::RiskFilter;
use signalbot_strategies::{build_predictor, CrossoverSignalGenerator, SignalEngine};
use tracing::{info, warn};

/// Wire generator, predictor, signal engine and risk filter into a
/// backtester from the configuration.
pub fn build_backtester(config: &AppConfig, telemetry: &Telemetry) -> Result<Backtester> {
    let generator = CrossoverSignalGenerator::new(
        config.signals.clone(),
        config.indicators.clone(),
        telemetry.child("generator"),
    )
    .context("Invalid signal configuration")?;

    let predictor = build_predictor(
        config.pipeline.predictor,
        generator,
        None,
        telemetry.child("predictor"),
    )
    .context("Failed to build predictor")?;

    let engine = SignalEngine::new(config.pipeline.clone(), predictor, telemetry.child("signals"))
        .context("Invalid pipeline configuration")?;
    let risk = RiskFilter::new(config.risk.clone(), telemetry.child("risk"))
        .context("Invalid risk configuration")?;

    Backtester::new(config.backtest.clone(), engine, risk, telemetry.clone())
        .context("Invalid backtest configuration")
}

/// Fetch every configured timeframe from the CSV data directory. Missing or
/// unreadable files become empty series.
pub async fn fetch(config: &AppConfig) -> MultiTimeframeData {
    let source = CsvMarketData::new(&config.data.dir, config.data.exchange.as_str());
    let data = source
        .fetch_timeframes(&config.data.symbol, &config.pipeline.timeframes, config.data.limit)
        .await;

    for (tf, series) in data.iter() {
        if series.is_empty() {
            warn!(symbol = %data.symbol, timeframe = %tf, "No candles loaded");
        }
    }
    info!(
        symbol = %data.symbol,
        exchange = %config.data.exchange,
        timeframes = data.len(),
        "Market data loaded"
    );
    data
}

/// Log notifier always, Telegram when configured.
pub fn notifiers(config: &AppConfig) -> Result<Vec<Box<dyn NotificationChannel>>> {
    let mut channels: Vec<Box<dyn NotificationChannel>> = vec![Box::new(LogNotifier)];
    if let Some(telegram) = &config.telegram {
        channels.push(Box::new(
            TelegramNotifier::new(telegram.clone()).context("Invalid Telegram configuration")?,
        ));
    }
    Ok(channels)
}

/// Publish to every channel. A failing channel is logged, not fatal.
pub async fn publish(
    channels: &[Box<dyn NotificationChannel>],
    report: &signalbot_backtest::BacktestReport,
) {
    for channel in channels {
        if let Err(e) = channel.publish(report).await {
            warn!(channel = channel.name(), error = %e, "Notification failed");
        }
    }
}

/// Persist every simulated signal and its trade, in report order.
pub async fn store_report(
    store: &dyn SignalStore,
    exchange: &str,
    report: &signalbot_backtest::BacktestReport,
) -> Result<()> {
    for signal in &report.signals {
        store
            .save_signal(exchange, signal)
            .await
            .context("Failed to store signal")?;
    }
    for trade in &report.trades {
        store
            .save_trade(exchange, trade)
            .await
            .context("Failed to store trade")?;
    }
    info!(
        store = store.name(),
        signals = report.signals.len(),
        trades = report.trades.len(),
        "Report stored"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalbot_backtest::{BacktestMode, BacktestReport, CostModel, Metrics, TradeSimulator};
    use signalbot_core::types::{Signal, SignalType, Timeframe};
    use signalbot_core::TelemetrySnapshot;
    use signalbot_data::{MemorySignalStore, Record};
    use signalbot_strategies::PredictorKind;

    #[test]
    fn test_default_pipeline_builds() {
        let backtester = build_backtester(&AppConfig::default(), &Telemetry::disabled()).unwrap();
        assert_eq!(backtester.engine().timeframes().len(), 4);
        assert_eq!(backtester.engine().predictor_name(), "rule_based");
    }

    #[test]
    fn test_learned_predictor_needs_model() {
        let mut config = AppConfig::default();
        config.pipeline.predictor = PredictorKind::Learned;
        assert!(build_backtester(&config, &Telemetry::disabled()).is_err());
    }

    #[tokio::test]
    async fn test_fetch_missing_directory_gives_empty_series() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.data.dir = dir.path().to_path_buf();

        let data = fetch(&config).await;
        assert_eq!(data.len(), 4);
        assert!(data.iter().all(|(_, s)| s.is_empty()));
    }

    #[tokio::test]
    async fn test_store_report_writes_signals_and_trades() {
        let signal = Signal::new("BTC/USDT", SignalType::Long, 100.0, 0.7, 0, Timeframe::Hour4)
            .with_levels(96.0, 106.0);
        let trade = TradeSimulator::new(CostModel::default(), Telemetry::disabled())
            .simulate(&signal, &[]);
        let report = BacktestReport {
            symbol: "BTC/USDT".into(),
            mode: BacktestMode::Latest,
            signals: vec![signal],
            rejected: 0,
            trades: vec![trade],
            metrics: Metrics::default(),
            telemetry: TelemetrySnapshot::default(),
        };

        let store = MemorySignalStore::default();
        store_report(&store, "binance", &report).await.unwrap();

        let records = store.records();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0].record, Record::Signal(_)));
        assert!(matches!(records[1].record, Record::Trade(_)));
        assert!(records.iter().all(|r| r.exchange == "binance"));
    }
}
