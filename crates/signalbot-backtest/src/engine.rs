//! Backtest engine: signal engine, risk filter, simulator and analyzer run
//! over one symbol's multi-timeframe data.

use rayon::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use signalbot_core::error::StrategyError;
use signalbot_core::types::{MultiTimeframeData, Signal};
use signalbot_core::Telemetry;
use signalbot_risk::{RiskDecision, RiskFilter};
use signalbot_strategies::{Evaluation, SignalEngine};
use std::fmt;
use tracing::{info, info_span, warn};

use crate::{
    BacktestReport, CostModel, ExitFill, Ledger, PerformanceAnalyzer, TradeSimulator,
};

/// How signals are drawn from the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BacktestMode {
    /// Evaluate once on the full series; exits use its trailing candles.
    #[default]
    Latest,
    /// Evaluate at every primary candle close on a point-in-time view;
    /// exits use the candles after the signal.
    WalkForward,
}

impl fmt::Display for BacktestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BacktestMode::Latest => write!(f, "latest"),
            BacktestMode::WalkForward => write!(f, "walk-forward"),
        }
    }
}

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub initial_capital: Decimal,
    /// Candles available to each trade's exit scan
    pub exit_window: usize,
    pub mode: BacktestMode,
    #[serde(flatten)]
    pub costs: CostModel,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10000),
            exit_window: 10,
            mode: BacktestMode::Latest,
            costs: CostModel::default(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(StrategyError::InvalidConfig(
                "Initial capital must be positive".into(),
            ));
        }
        if self.exit_window == 0 {
            return Err(StrategyError::InvalidConfig(
                "Exit window must be at least one candle".into(),
            ));
        }
        self.costs.validate()
    }
}

/// Runs the full pipeline for one symbol.
pub struct Backtester {
    config: BacktestConfig,
    engine: SignalEngine,
    risk: RiskFilter,
    simulator: TradeSimulator,
    analyzer: PerformanceAnalyzer,
    telemetry: Telemetry,
}

impl Backtester {
    pub fn new(
        config: BacktestConfig,
        engine: SignalEngine,
        risk: RiskFilter,
        telemetry: Telemetry,
    ) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            simulator: TradeSimulator::new(config.costs.clone(), telemetry.child("simulator")),
            analyzer: PerformanceAnalyzer::new(config.initial_capital, telemetry.child("performance")),
            config,
            engine,
            risk,
            telemetry,
        })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    pub fn run(&self, data: &MultiTimeframeData) -> BacktestReport {
        let span = info_span!(
            parent: self.telemetry.span(),
            "backtest",
            symbol = %data.symbol,
            mode = %self.config.mode
        );
        let _enter = span.enter();

        let evaluations = match self.config.mode {
            BacktestMode::Latest => vec![self.engine.evaluate(data)],
            BacktestMode::WalkForward => self.walk_forward(data),
        };

        let mut rejected = 0;
        let mut confirmed = Vec::new();
        for evaluation in evaluations {
            match evaluation {
                Evaluation::Confirmed(signal) => confirmed.push(signal),
                Evaluation::Rejected { .. } => rejected += 1,
                Evaluation::NoSignal => {}
            }
        }

        let mut accepted = Vec::with_capacity(confirmed.len());
        for signal in confirmed {
            let history = data
                .get(signal.timeframe)
                .map(|s| s.closed_by(signal.timestamp + signal.timeframe.as_secs()))
                .unwrap_or_default();
            match self.risk.screen(signal, history) {
                RiskDecision::Accepted { signal, .. } => accepted.push(signal),
                RiskDecision::Rejected { .. } => rejected += 1,
            }
        }

        // Exits do not depend on position size.
        let fills: Vec<(Signal, ExitFill)> = accepted
            .into_par_iter()
            .map(|signal| {
                let fill = self.exit_fill(&signal, data);
                (signal, fill)
            })
            .collect();

        let ledger = fills.into_iter().fold(
            Ledger::new(self.config.initial_capital),
            |ledger, (signal, fill)| {
                let sized = self.risk.size(signal, ledger.balance());
                let trade = self.simulator.settle(&sized, &fill);
                ledger.post(sized, trade)
            },
        );
        let (signals, trades) = ledger.into_parts();
        let metrics = self.analyzer.analyze(&trades);

        info!(
            signals = signals.len(),
            rejected,
            trades = trades.len(),
            final_equity = %metrics.final_equity,
            "Backtest complete"
        );

        BacktestReport {
            symbol: data.symbol.clone(),
            mode: self.config.mode,
            signals,
            rejected,
            trades,
            metrics,
            telemetry: self.telemetry.snapshot(),
        }
    }

    /// One evaluation per primary candle after warm-up, each on the data as
    /// it stood when that candle closed.
    fn walk_forward(&self, data: &MultiTimeframeData) -> Vec<Evaluation> {
        let primary = self.engine.primary();
        let Some(series) = data.get(primary) else {
            warn!(timeframe = %primary, "No primary series for walk-forward");
            return Vec::new();
        };

        let start = self.engine.warmup_period().saturating_sub(1);
        let secs = primary.as_secs();
        series
            .candles()
            .get(start..)
            .unwrap_or_default()
            .par_iter()
            .map(|candle| self.engine.evaluate(&data.as_of(candle.timestamp + secs)))
            .collect()
    }

    fn exit_fill(&self, signal: &Signal, data: &MultiTimeframeData) -> ExitFill {
        let window = data.get(signal.timeframe).map(|series| match self.config.mode {
            BacktestMode::Latest => series.tail(self.config.exit_window),
            BacktestMode::WalkForward => series.after(signal.timestamp, self.config.exit_window),
        });
        self.simulator.exit(signal, window.unwrap_or_default())
    }
}
