//! Market data sources and signal stores.

mod csv_source;
mod memory;
mod store;

pub use csv_source::CsvMarketData;
pub use memory::{MemoryMarketData, MemorySignalStore};
pub use store::{JsonlSignalStore, Record, StoredRecord};

use signalbot_core::error::DataError;
use signalbot_core::types::{CandleSeries, Timeframe};
use signalbot_core::MarketDataSource;
use std::path::Path;

/// Load one series from a CSV data directory.
pub async fn load_csv(
    root: impl AsRef<Path>,
    exchange: &str,
    symbol: &str,
    timeframe: Timeframe,
    limit: usize,
) -> Result<CandleSeries, DataError> {
    let source = CsvMarketData::new(root.as_ref(), exchange);
    let candles = source.fetch(symbol, timeframe, limit).await?;
    Ok(CandleSeries::from_unsorted(symbol, timeframe, candles))
}
