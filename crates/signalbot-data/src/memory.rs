//! In-memory market data and signal store.

use async_trait::async_trait;
use signalbot_core::error::{DataError, StoreError};
use signalbot_core::types::{Candle, Signal, Timeframe, Trade};
use signalbot_core::{MarketDataSource, SignalStore};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::store::{Record, StoredRecord};

/// Candles held in memory, keyed by symbol and timeframe. Individual
/// series can be scripted to fail.
#[derive(Debug, Default, Clone)]
pub struct MemoryMarketData {
    series: HashMap<(String, Timeframe), Vec<Candle>>,
    failing: HashSet<(String, Timeframe)>,
}

impl MemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
        self.insert(symbol, timeframe, candles);
        self
    }

    pub fn insert(&mut self, symbol: &str, timeframe: Timeframe, candles: Vec<Candle>) {
        self.series.insert((symbol.to_string(), timeframe), candles);
    }

    /// Make every fetch of `symbol` on `timeframe` fail.
    pub fn fail(mut self, symbol: &str, timeframe: Timeframe) -> Self {
        self.failing.insert((symbol.to_string(), timeframe));
        self
    }
}

#[async_trait]
impl MarketDataSource for MemoryMarketData {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let key = (symbol.to_string(), timeframe);
        if self.failing.contains(&key) {
            return Err(DataError::ConnectionError(format!(
                "scripted failure for {} {}",
                symbol, timeframe
            )));
        }
        let candles = self
            .series
            .get(&key)
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;
        Ok(candles[candles.len().saturating_sub(limit)..].to_vec())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Signal store that keeps records in a vector.
#[derive(Debug, Default)]
pub struct MemorySignalStore {
    records: Mutex<Vec<StoredRecord>>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<StoredRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    fn push(&self, record: StoredRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .push(record);
        Ok(())
    }
}

#[async_trait]
impl SignalStore for MemorySignalStore {
    async fn save_signal(&self, exchange: &str, signal: &Signal) -> Result<(), StoreError> {
        self.push(StoredRecord::new(exchange, Record::Signal(signal.clone())))
    }

    async fn save_trade(&self, exchange: &str, trade: &Trade) -> Result<(), StoreError> {
        self.push(StoredRecord::new(exchange, Record::Trade(trade.clone())))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
