//! Validate configuration command.

use anyhow::Result;
use signalbot_config::AppConfig;

pub fn run(config: &AppConfig, from_file: bool) -> Result<()> {
    if !from_file {
        println!("No --config given; validating defaults with environment overrides");
    }

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    let timeframes: Vec<String> = config.pipeline.timeframes.iter().map(|tf| tf.to_string()).collect();

    println!("Configuration is valid!");
    for warning in config.warnings() {
        println!("Warning: {}", warning);
    }
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("Market: {} on {}", config.data.symbol, config.data.exchange);
    println!("Timeframes: {}", timeframes.join(", "));
    println!("Predictor: {}", config.pipeline.predictor);
    println!("Min confirmation score: {:.2}", config.pipeline.min_confirmation_score);
    println!("Min risk/reward: {:.2}", config.risk.min_risk_reward);
    println!("Risk per trade: {}", config.risk.max_risk_fraction);
    println!("Backtest mode: {}", config.backtest.mode);
    println!(
        "Telegram: {}",
        if config.telegram.is_some() { "enabled" } else { "disabled" }
    );

    Ok(())
}
