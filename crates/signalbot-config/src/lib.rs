//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, DataSettings};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Prefix of environment overrides, e.g. `SIGNALBOT__RISK__MIN_RISK_REWARD=2`.
pub const ENV_PREFIX: &str = "SIGNALBOT";

/// Load configuration from file and environment.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    build(Some(path))
}

/// Defaults plus environment overrides, for runs without a config file.
pub fn load_env_only() -> Result<AppConfig, ConfigError> {
    build(None)
}

fn build(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}
