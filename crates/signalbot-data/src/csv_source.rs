//! CSV market data.
//!
//! Files live at `<root>/<exchange>/<SYMBOL>_<timeframe>.csv` with the
//! header `timestamp,open,high,low,close,volume`. The symbol's `/` is
//! dropped, so `BTC/USDT` on 4h reads `BTCUSDT_4h.csv`.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use signalbot_core::error::DataError;
use signalbot_core::types::{Candle, Timeframe};
use signalbot_core::MarketDataSource;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Unix timestamps above this are taken as milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "Timestamp", alias = "time")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

#[derive(Debug, Serialize)]
struct CsvRow {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Historical candles from a directory of per-exchange CSV files.
#[derive(Debug, Clone)]
pub struct CsvMarketData {
    root: PathBuf,
    exchange: String,
}

impl CsvMarketData {
    pub fn new(root: impl Into<PathBuf>, exchange: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            exchange: exchange.into(),
        }
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// File holding `symbol` on `timeframe`.
    pub fn path_for(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.root
            .join(&self.exchange)
            .join(format!("{}_{}.csv", symbol.replace('/', ""), timeframe))
    }

    /// Write candles to the file for `symbol` on `timeframe`, replacing it.
    pub fn save(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<PathBuf, DataError> {
        let path = self.path_for(symbol, timeframe);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| DataError::Internal(e.to_string()))?;
        }
        let mut writer = WriterBuilder::new()
            .from_path(&path)
            .map_err(|e| DataError::Internal(e.to_string()))?;
        for c in candles {
            writer
                .serialize(CsvRow {
                    timestamp: c.timestamp,
                    open: c.open,
                    high: c.high,
                    low: c.low,
                    close: c.close,
                    volume: c.volume,
                })
                .map_err(|e| DataError::Internal(e.to_string()))?;
        }
        writer.flush().map_err(|e| DataError::Internal(e.to_string()))?;
        Ok(path)
    }
}

#[async_trait]
impl MarketDataSource for CsvMarketData {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let path = self.path_for(symbol, timeframe);
        if !path.exists() {
            return Err(DataError::SymbolNotFound(format!(
                "{} {} ({})",
                symbol,
                timeframe,
                path.display()
            )));
        }

        let candles = tokio::task::spawn_blocking(move || load_from_path(&path))
            .await
            .map_err(|e| DataError::Internal(e.to_string()))??;

        let start = candles.len().saturating_sub(limit);
        debug!(
            exchange = %self.exchange,
            symbol,
            timeframe = %timeframe,
            loaded = candles.len(),
            returned = candles.len() - start,
            "CSV candles loaded"
        );
        Ok(candles[start..].to_vec())
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Read every row, sorted by timestamp; a repeated timestamp keeps the
/// later row.
fn load_from_path(path: &Path) -> Result<Vec<Candle>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DataError::ParseError(e.to_string()))?;

    let mut by_time = BTreeMap::new();
    for result in reader.deserialize() {
        let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
        let timestamp = parse_timestamp(&record.timestamp)?;
        by_time.insert(
            timestamp,
            Candle::new(
                timestamp,
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume,
            ),
        );
    }

    Ok(by_time.into_values().collect())
}

/// Unix seconds or milliseconds, or a UTC date/datetime string. Returns
/// seconds.
fn parse_timestamp(raw: &str) -> Result<i64, DataError> {
    if let Ok(ts) = raw.parse::<i64>() {
        return Ok(if ts > MILLIS_THRESHOLD { ts / 1000 } else { ts });
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.and_utc().timestamp());
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt.and_utc().timestamp());
    }

    Err(DataError::ParseError(format!(
        "Could not parse timestamp: {}",
        raw
    )))
}
