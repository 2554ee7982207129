//! Market data source trait.

use async_trait::async_trait;
use futures::future::join_all;
use tracing::warn;

use crate::error::DataError;
use crate::types::{Candle, CandleSeries, MultiTimeframeData, Timeframe};

/// Supplier of historical candles.
///
/// Implementations may fail or return fewer candles than requested. The
/// provided methods turn both into an empty or short series, which the
/// pipeline treats as "no signal".
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch up to `limit` of the most recent candles, oldest first.
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError>;

    fn name(&self) -> &str;

    /// Fetch a series, degrading any failure to an empty series.
    async fn fetch_series(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> CandleSeries {
        match self.fetch(symbol, timeframe, limit).await {
            Ok(candles) => CandleSeries::from_unsorted(symbol, timeframe, candles),
            Err(e) => {
                warn!(
                    source = self.name(),
                    symbol,
                    timeframe = %timeframe,
                    error = %e,
                    "Fetch failed, continuing with an empty series"
                );
                CandleSeries::new(symbol, timeframe)
            }
        }
    }

    /// Fetch every timeframe concurrently.
    async fn fetch_timeframes(
        &self,
        symbol: &str,
        timeframes: &[Timeframe],
        limit: usize,
    ) -> MultiTimeframeData {
        let fetches = timeframes
            .iter()
            .map(|tf| self.fetch_series(symbol, *tf, limit));
        let mut data = MultiTimeframeData::new(symbol);
        for series in join_all(fetches).await {
            data.insert(series);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakySource;

    #[async_trait]
    impl MarketDataSource for FlakySource {
        async fn fetch(
            &self,
            _symbol: &str,
            timeframe: Timeframe,
            limit: usize,
        ) -> Result<Vec<Candle>, DataError> {
            if timeframe == Timeframe::Hour4 {
                return Err(DataError::ConnectionError("timeout".into()));
            }
            // Newest first, with a duplicate, to exercise normalisation.
            let mut candles: Vec<Candle> = (0..limit as i64)
                .rev()
                .map(|i| Candle::new(i * timeframe.as_secs(), 1.0, 1.0, 1.0, 1.0, 1.0))
                .collect();
            candles.push(candles[0]);
            Ok(candles)
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_degrades_to_empty_series() {
        let series = FlakySource
            .fetch_series("BTC/USDT", Timeframe::Hour4, 10)
            .await;
        assert!(series.is_empty());
        assert_eq!(series.timeframe, Timeframe::Hour4);
    }

    #[tokio::test]
    async fn test_fetch_timeframes_normalises_order() {
        let data = FlakySource
            .fetch_timeframes("BTC/USDT", &Timeframe::default_ladder(), 5)
            .await;
        assert_eq!(data.len(), 4);

        let m5 = data.get(Timeframe::Minute5).unwrap();
        assert_eq!(m5.len(), 5);
        assert!(m5.candles().windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(data.get(Timeframe::Hour4).unwrap().is_empty());
    }
}
