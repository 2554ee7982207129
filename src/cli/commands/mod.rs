//! CLI command implementations.

pub mod backtest;
pub mod init_config;
pub mod pipeline;
pub mod scan;
pub mod validate;
