//! Telemetry handle injected into pipeline components.
//!
//! The process entry point owns the subscriber lifecycle. Components only
//! receive a [`Telemetry`] at construction: a parent span for their log
//! events and a set of shared counters describing what the pipeline did.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::Span;

/// Countable pipeline events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A per-timeframe candidate signal was produced.
    Candidate,
    /// A cross-timeframe signal passed confirmation.
    Confirmed,
    /// A signal was filtered out (confirmation, trend or risk).
    Rejected,
    /// A trade was simulated and settled.
    TradeSimulated,
}

#[derive(Debug, Default)]
struct Counters {
    candidates: AtomicU64,
    confirmed: AtomicU64,
    rejected: AtomicU64,
    trades: AtomicU64,
}

/// Point-in-time copy of the pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub candidates: u64,
    pub confirmed: u64,
    pub rejected: u64,
    pub trades: u64,
}

/// Cheaply clonable logging and counting handle.
#[derive(Debug, Clone)]
pub struct Telemetry {
    span: Span,
    counters: Arc<Counters>,
}

impl Telemetry {
    /// Create a handle whose events are children of `span`.
    pub fn new(span: Span) -> Self {
        Self {
            span,
            counters: Arc::new(Counters::default()),
        }
    }

    /// A handle that logs without a parent span, for tests and tools.
    pub fn disabled() -> Self {
        Self::new(Span::none())
    }

    /// Parent span for component log events.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Derive a handle for a sub-component sharing the same counters.
    pub fn child(&self, component: &'static str) -> Self {
        Self {
            span: tracing::debug_span!(parent: &self.span, "component", name = component),
            counters: Arc::clone(&self.counters),
        }
    }

    /// Count one event.
    pub fn record(&self, event: PipelineEvent) {
        let counter = match event {
            PipelineEvent::Candidate => &self.counters.candidates,
            PipelineEvent::Confirmed => &self.counters.confirmed,
            PipelineEvent::Rejected => &self.counters.rejected,
            PipelineEvent::TradeSimulated => &self.counters.trades,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the counters.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            candidates: self.counters.candidates.load(Ordering::Relaxed),
            confirmed: self.counters.confirmed.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            trades: self.counters.trades.load(Ordering::Relaxed),
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_share_counters() {
        let root = Telemetry::disabled();
        let child = root.child("risk");

        root.record(PipelineEvent::Candidate);
        child.record(PipelineEvent::Rejected);
        child.record(PipelineEvent::Rejected);

        let snapshot = root.snapshot();
        assert_eq!(snapshot.candidates, 1);
        assert_eq!(snapshot.rejected, 2);
        assert_eq!(snapshot.trades, 0);
        assert_eq!(child.snapshot(), snapshot);
    }

    #[test]
    fn test_independent_handles() {
        let a = Telemetry::disabled();
        let b = Telemetry::disabled();
        a.record(PipelineEvent::TradeSimulated);
        assert_eq!(b.snapshot().trades, 0);
    }
}
