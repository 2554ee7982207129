//! Scan command: evaluate the most recent candles once.

use anyhow::{Context, Result};
use signalbot_backtest::BacktestMode;
use signalbot_config::AppConfig;
use signalbot_core::Telemetry;
use signalbot_data::JsonlSignalStore;
use tracing::{info, warn};

use super::pipeline;
use crate::cli::ScanArgs;

pub async fn run(args: ScanArgs, mut config: AppConfig) -> Result<()> {
    args.source.apply(&mut config);
    config.backtest.mode = BacktestMode::Latest;
    config.validate().context("Invalid configuration")?;
    for warning in config.warnings() {
        warn!("{warning}");
    }

    let telemetry = Telemetry::new(tracing::info_span!("signalbot", command = "scan"));
    let backtester = pipeline::build_backtester(&config, &telemetry)?;
    let channels = if args.no_notify {
        Vec::new()
    } else {
        pipeline::notifiers(&config)?
    };

    let data = pipeline::fetch(&config).await;
    let report = tokio::task::spawn_blocking(move || backtester.run(&data))
        .await
        .context("Scan task failed")?;

    if report.signals.is_empty() {
        println!(
            "No confirmed signal for {} ({} rejected)",
            report.symbol, report.rejected
        );
        return Ok(());
    }

    for signal in &report.signals {
        println!("{signal}");
    }

    if !args.no_store {
        let store = JsonlSignalStore::new(&config.data.signal_log);
        pipeline::store_report(&store, &config.data.exchange, &report).await?;
        info!(path = %store.path().display(), "Signal log updated");
    }

    pipeline::publish(&channels, &report).await;
    Ok(())
}
