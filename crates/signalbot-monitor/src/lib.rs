//! Logging lifecycle and report notifications.

mod logging;
mod notify;

pub use logging::{init_logging, LogOptions, LoggingGuard};
pub use notify::{format_message, LogNotifier, TelegramConfig, TelegramNotifier};
