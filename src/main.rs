//! Signal bot CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use signalbot_config::{load_config, load_env_only, AppConfig};
use signalbot_monitor::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Needs no config and prints to stdout, so it runs before logging.
    if let Commands::InitConfig(args) = &cli.command {
        return cli::commands::init_config::run(args);
    }

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => load_env_only().context("Failed to load configuration from environment")?,
    };

    let mut log_options = config.logging.clone();
    if let Some(level) = cli.log_level {
        log_options.level = level.as_str().to_string();
    }
    if cli.json_logs {
        log_options.json = true;
    }
    let guard = init_logging(&log_options).context("Failed to initialise logging")?;

    let result = dispatch(cli.command, config, cli.config.is_some()).await;

    guard.shutdown();
    result
}

async fn dispatch(command: Commands, config: AppConfig, from_file: bool) -> Result<()> {
    match command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, config).await,
        Commands::Scan(args) => cli::commands::scan::run(args, config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&config, from_file),
        Commands::InitConfig(_) => Ok(()),
    }
}
