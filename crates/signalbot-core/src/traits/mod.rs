//! Collaborator and indicator traits.

mod data_source;
mod indicator;
mod store;

pub use data_source::MarketDataSource;
pub use indicator::{CandleIndicator, Indicator};
pub use store::SignalStore;
