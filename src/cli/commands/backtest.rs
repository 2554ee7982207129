//! Backtest command implementation.

use anyhow::{Context, Result};
use signalbot_config::AppConfig;
use signalbot_core::Telemetry;
use tracing::{info, warn};

use super::pipeline;
use crate::cli::{BacktestArgs, OutputFormat};

pub async fn run(args: BacktestArgs, mut config: AppConfig) -> Result<()> {
    args.source.apply(&mut config);
    if let Some(mode) = args.mode {
        config.backtest.mode = mode.into();
    }
    config.validate().context("Invalid configuration")?;
    for warning in config.warnings() {
        warn!("{warning}");
    }

    info!(
        symbol = %config.data.symbol,
        exchange = %config.data.exchange,
        mode = %config.backtest.mode,
        "Starting backtest"
    );

    let telemetry = Telemetry::new(tracing::info_span!("signalbot", command = "backtest"));
    let backtester = pipeline::build_backtester(&config, &telemetry)?;
    let channels = if args.notify {
        pipeline::notifiers(&config)?
    } else {
        Vec::new()
    };

    let data = pipeline::fetch(&config).await;
    // CPU-bound and internally parallel; keep it off the async workers.
    let report = tokio::task::spawn_blocking(move || backtester.run(&data))
        .await
        .context("Backtest task failed")?;

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}", report.summary()),
    }

    if let Some(save_path) = &args.save {
        std::fs::write(save_path, report.to_json()?)
            .with_context(|| format!("Failed to write {}", save_path.display()))?;
        info!("Results saved to {:?}", save_path);
    }

    pipeline::publish(&channels, &report).await;
    Ok(())
}
