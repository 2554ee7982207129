//! Cross-timeframe confirmation.

use signalbot_core::error::StrategyError;
use signalbot_core::types::{Signal, Timeframe};
use signalbot_core::Telemetry;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Merges per-timeframe candidates into one signal on the primary (highest)
/// timeframe.
#[derive(Debug, Clone)]
pub struct ConfirmationAggregator {
    /// Deduplicated, shortest first; the last entry is primary.
    timeframes: Vec<Timeframe>,
    telemetry: Telemetry,
}

impl ConfirmationAggregator {
    pub fn new(timeframes: &[Timeframe], telemetry: Telemetry) -> Result<Self, StrategyError> {
        let mut timeframes = timeframes.to_vec();
        timeframes.sort();
        timeframes.dedup();
        if timeframes.is_empty() {
            return Err(StrategyError::InvalidConfig(
                "At least one timeframe required".into(),
            ));
        }
        Ok(Self {
            timeframes,
            telemetry,
        })
    }

    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    pub fn primary(&self) -> Timeframe {
        // `new` guarantees at least one timeframe.
        self.timeframes[self.timeframes.len() - 1]
    }

    /// Confirm the primary candidate against the other timeframes.
    ///
    /// The primary counts as one confirmation, so a lone primary scores
    /// `1 / timeframes.len()`. Candidates on unconfigured timeframes are
    /// ignored.
    pub fn aggregate(&self, candidates: &BTreeMap<Timeframe, Signal>) -> Option<Signal> {
        let primary_tf = self.primary();
        let Some(primary) = candidates.get(&primary_tf) else {
            debug!(parent: self.telemetry.span(), timeframe = %primary_tf, "No primary signal");
            return None;
        };

        let (confirmations, confidence_sum) = self
            .timeframes
            .iter()
            .filter(|tf| **tf != primary_tf)
            .filter_map(|tf| candidates.get(tf))
            .filter(|s| s.signal_type == primary.signal_type)
            .fold((0u32, 0.0), |(n, sum), s| (n + 1, sum + s.confidence()));

        let confirmed = confirmations + 1;
        let mut signal = primary.clone();
        signal.confirmed_timeframes = confirmed;
        signal.set_confirmation_score(confirmed as f64 / self.timeframes.len() as f64);
        signal.set_avg_confidence((primary.confidence() + confidence_sum) / confirmed as f64);

        info!(
            parent: self.telemetry.span(),
            symbol = %signal.symbol,
            signal_type = %signal.signal_type,
            confirmed_timeframes = confirmed,
            total_timeframes = self.timeframes.len(),
            confirmation_score = signal.confirmation_score(),
            avg_confidence = signal.avg_confidence(),
            "Signal confirmation"
        );

        Some(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signalbot_core::types::SignalType;

    fn candidate(tf: Timeframe, signal_type: SignalType, confidence: f64) -> (Timeframe, Signal) {
        (
            tf,
            Signal::new("BTC/USDT", signal_type, 100.0, confidence, 0, tf).with_levels(98.0, 103.0),
        )
    }

    fn aggregator() -> ConfirmationAggregator {
        ConfirmationAggregator::new(&Timeframe::default_ladder(), Telemetry::disabled()).unwrap()
    }

    #[test]
    fn test_primary_is_highest_timeframe() {
        let agg = ConfirmationAggregator::new(
            &[Timeframe::Hour4, Timeframe::Minute5, Timeframe::Hour1, Timeframe::Hour4],
            Telemetry::disabled(),
        )
        .unwrap();
        assert_eq!(agg.primary(), Timeframe::Hour4);
        assert_eq!(agg.timeframes().len(), 3);
        assert!(ConfirmationAggregator::new(&[], Telemetry::disabled()).is_err());
    }

    #[test]
    fn test_no_primary_no_signal() {
        let candidates: BTreeMap<_, _> = [
            candidate(Timeframe::Minute5, SignalType::Long, 0.7),
            candidate(Timeframe::Minute15, SignalType::Long, 0.7),
            candidate(Timeframe::Hour1, SignalType::Long, 0.7),
        ]
        .into_iter()
        .collect();
        assert!(aggregator().aggregate(&candidates).is_none());
    }

    #[test]
    fn test_lone_primary() {
        let candidates: BTreeMap<_, _> =
            [candidate(Timeframe::Hour4, SignalType::Short, 0.8)].into_iter().collect();
        let signal = aggregator().aggregate(&candidates).unwrap();

        assert_eq!(signal.confirmed_timeframes, 1);
        assert_eq!(signal.confirmation_score(), 0.25);
        assert_eq!(signal.avg_confidence(), 0.8);
        assert_eq!(signal.timeframe, Timeframe::Hour4);
    }

    #[test]
    fn test_only_agreeing_timeframes_confirm() {
        let candidates: BTreeMap<_, _> = [
            candidate(Timeframe::Minute5, SignalType::Long, 0.6),
            candidate(Timeframe::Minute15, SignalType::Short, 0.9),
            candidate(Timeframe::Hour1, SignalType::Long, 0.7),
            candidate(Timeframe::Hour4, SignalType::Long, 0.8),
        ]
        .into_iter()
        .collect();
        let signal = aggregator().aggregate(&candidates).unwrap();

        assert_eq!(signal.confirmed_timeframes, 3);
        assert_eq!(signal.confirmation_score(), 0.75);
        assert!((signal.avg_confidence() - 0.7).abs() < 1e-12);
        // Raw confidence is the primary's own.
        assert_eq!(signal.confidence(), 0.8);
    }

    #[test]
    fn test_unconfigured_timeframes_ignored() {
        let candidates: BTreeMap<_, _> = [
            candidate(Timeframe::Daily, SignalType::Long, 0.9),
            candidate(Timeframe::Hour4, SignalType::Long, 0.8),
        ]
        .into_iter()
        .collect();
        let signal = aggregator().aggregate(&candidates).unwrap();
        assert_eq!(signal.confirmed_timeframes, 1);
    }
}
