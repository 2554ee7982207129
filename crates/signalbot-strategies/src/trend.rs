//! Long-horizon trend filter.

use serde::{Deserialize, Serialize};
use signalbot_core::error::StrategyError;
use signalbot_core::traits::Indicator;
use signalbot_core::types::{CandleSeries, Signal, SignalType};
use signalbot_core::Telemetry;
use signalbot_indicators::Ema;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendFilterConfig {
    pub enabled: bool,
    pub period: usize,
}

impl Default for TrendFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period: 200,
        }
    }
}

/// Keeps only signals trading with the long EMA: LONG above it, SHORT below.
/// Series shorter than the period pass.
#[derive(Debug, Clone)]
pub struct TrendFilter {
    ema: Ema,
    telemetry: Telemetry,
}

impl TrendFilter {
    pub fn new(period: usize, telemetry: Telemetry) -> Result<Self, StrategyError> {
        let ema = Ema::new(period).map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        Ok(Self { ema, telemetry })
    }

    pub fn passes(&self, signal: &Signal, series: &CandleSeries) -> bool {
        let closes = series.closes();
        let (Some(trend), Some(&close)) = (self.ema.last(&closes), closes.last()) else {
            return true;
        };

        let aligned = match signal.signal_type {
            SignalType::Long => close > trend,
            SignalType::Short => close < trend,
        };
        if !aligned {
            info!(
                parent: self.telemetry.span(),
                symbol = %signal.symbol,
                signal_type = %signal.signal_type,
                close,
                trend,
                period = self.ema.period(),
                "Signal against trend"
            );
        }
        aligned
    }
}
