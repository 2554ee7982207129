//! Logging setup.
//!
//! Called once by the binary. Library crates never install a subscriber.

use serde::{Deserialize, Serialize};
use signalbot_core::SignalBotError;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logging options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// JSON console output instead of pretty. Console logs go to stderr.
    pub json: bool,
    /// Also write plain-text logs to this file, rotated daily
    pub file: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

/// Keeps the background file writer alive. Dropping it flushes buffered
/// lines; [`LoggingGuard::shutdown`] does so explicitly.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard {
    file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    pub fn writes_file(&self) -> bool {
        self.file_guard.is_some()
    }

    /// Flush and stop the file writer.
    pub fn shutdown(self) {
        tracing::debug!("Logging shut down");
        drop(self.file_guard);
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(options: &LogOptions) -> Result<LoggingGuard, SignalBotError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&options.level)
            .map_err(|e| SignalBotError::Config(format!("Invalid log level: {}", e)))?,
    };

    let (json_layer, pretty_layer) = if options.json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(fmt::layer().pretty().with_writer(std::io::stderr)))
    };

    let (file_layer, file_guard) = match &options.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let name = path
                .file_name()
                .ok_or_else(|| SignalBotError::Config(format!("Invalid log file: {}", path.display())))?;
            std::fs::create_dir_all(&dir)?;

            let appender = tracing_appender::rolling::daily(&dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| SignalBotError::Config(format!("Logging already initialised: {}", e)))?;

    Ok(LoggingGuard { file_guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_level_is_config_error() {
        // Only reached when RUST_LOG does not override the level.
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let options = LogOptions {
            level: "signalbot=loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            init_logging(&options),
            Err(SignalBotError::Config(_))
        ));
    }

    #[test]
    fn test_file_logging_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let options = LogOptions {
            file: Some(dir.path().join("logs/signalbot.log")),
            ..Default::default()
        };

        let guard = init_logging(&options).unwrap();
        assert!(guard.writes_file());
        tracing::error!("lifecycle test line");

        // A second subscriber is refused.
        assert!(init_logging(&LogOptions::default()).is_err());

        guard.shutdown();
        let written: usize = std::fs::read_dir(dir.path().join("logs"))
            .unwrap()
            .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap().len())
            .sum();
        assert!(written > 0);
    }
}
