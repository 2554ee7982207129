//! OHLCV candle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Timeframe;
use crate::error::DataError;

/// Persisted/exchanged candle layout:
/// `(timestamp, open, high, low, close, volume)`, timestamp in whole seconds.
pub type CandleRow = (i64, f64, f64, f64, f64, f64);

/// One OHLCV interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "CandleRow", into = "CandleRow")]
pub struct Candle {
    /// Interval open time, seconds since the Unix epoch
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Create a new candle.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// High minus low.
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// True range against the previous close; the plain range when there is
    /// no previous candle.
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            Some(pc) => self
                .range()
                .max((self.high - pc).abs())
                .max((self.low - pc).abs()),
            None => self.range(),
        }
    }

    /// Open time as a UTC datetime.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// The six-field wire layout.
    pub fn to_row(&self) -> CandleRow {
        (*self).into()
    }
}

impl From<CandleRow> for Candle {
    fn from((timestamp, open, high, low, close, volume): CandleRow) -> Self {
        Self::new(timestamp, open, high, low, close, volume)
    }
}

impl From<Candle> for CandleRow {
    fn from(c: Candle) -> Self {
        (c.timestamp, c.open, c.high, c.low, c.close, c.volume)
    }
}

/// Candles of one symbol and timeframe with strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct CandleSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    candles: Vec<Candle>,
}

/// Unchecked deserialized form; ordering is enforced by `from_candles`.
#[derive(Deserialize)]
struct RawSeries {
    symbol: String,
    timeframe: Timeframe,
    candles: Vec<Candle>,
}

impl TryFrom<RawSeries> for CandleSeries {
    type Error = DataError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        Self::from_candles(raw.symbol, raw.timeframe, raw.candles)
    }
}

impl CandleSeries {
    /// Create an empty series.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            candles: Vec::new(),
        }
    }

    /// Build a series from candles that must already be strictly ordered.
    pub fn from_candles(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        candles: Vec<Candle>,
    ) -> Result<Self, DataError> {
        if let Some(pair) = candles.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(DataError::OutOfOrder {
                previous: pair[0].timestamp,
                next: pair[1].timestamp,
            });
        }
        Ok(Self {
            symbol: symbol.into(),
            timeframe,
            candles,
        })
    }

    /// Build a series from loosely ordered candles: sorts by timestamp and
    /// keeps the last candle seen for a repeated timestamp.
    pub fn from_unsorted(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        candles: impl IntoIterator<Item = Candle>,
    ) -> Self {
        let by_time: BTreeMap<i64, Candle> =
            candles.into_iter().map(|c| (c.timestamp, c)).collect();
        Self {
            symbol: symbol.into(),
            timeframe,
            candles: by_time.into_values().collect(),
        }
    }

    /// Append a candle newer than the current last one.
    pub fn push(&mut self, candle: Candle) -> Result<(), DataError> {
        if let Some(last) = self.candles.last() {
            if candle.timestamp <= last.timestamp {
                return Err(DataError::OutOfOrder {
                    previous: last.timestamp,
                    next: candle.timestamp,
                });
            }
        }
        self.candles.push(candle);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// The trailing `n` candles (fewer when the series is shorter).
    pub fn tail(&self, n: usize) -> &[Candle] {
        &self.candles[self.candles.len().saturating_sub(n)..]
    }

    /// Up to `n` candles opening strictly after `timestamp`.
    pub fn after(&self, timestamp: i64, n: usize) -> &[Candle] {
        let start = self.candles.partition_point(|c| c.timestamp <= timestamp);
        let end = (start + n).min(self.candles.len());
        &self.candles[start..end]
    }

    /// Candles that have fully closed by `close_time`.
    pub fn closed_by(&self, close_time: i64) -> &[Candle] {
        let secs = self.timeframe.as_secs();
        let end = self
            .candles
            .partition_point(|c| c.timestamp + secs <= close_time);
        &self.candles[..end]
    }

    /// Copy of this series restricted to candles closed by `close_time`.
    pub fn as_of(&self, close_time: i64) -> Self {
        Self {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            candles: self.closed_by(close_time).to_vec(),
        }
    }

    /// Close time of the last candle.
    pub fn last_close_time(&self) -> Option<i64> {
        self.last().map(|c| c.timestamp + self.timeframe.as_secs())
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }
}

/// The per-timeframe series of one symbol, as fetched for a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiTimeframeData {
    pub symbol: String,
    series: BTreeMap<Timeframe, CandleSeries>,
}

impl MultiTimeframeData {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            series: BTreeMap::new(),
        }
    }

    /// Insert (or replace) the series for its timeframe.
    pub fn insert(&mut self, series: CandleSeries) {
        self.series.insert(series.timeframe, series);
    }

    pub fn get(&self, timeframe: Timeframe) -> Option<&CandleSeries> {
        self.series.get(&timeframe)
    }

    pub fn timeframes(&self) -> impl Iterator<Item = Timeframe> + '_ {
        self.series.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Timeframe, &CandleSeries)> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Point-in-time view: every series cut to the candles closed by
    /// `close_time`.
    pub fn as_of(&self, close_time: i64) -> Self {
        Self {
            symbol: self.symbol.clone(),
            series: self
                .series
                .iter()
                .map(|(tf, s)| (*tf, s.as_of(close_time)))
                .collect(),
        }
    }
}
