//! Risk filter: volatility levels, reward check and sizing composed in order.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use signalbot_core::error::StrategyError;
use signalbot_core::types::{Candle, Signal};
use signalbot_core::{PipelineEvent, Telemetry};
use tracing::debug;

use crate::{PositionSizer, RewardValidator, VolatilityAdjuster};

/// Risk filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Re-derive stop and target from ATR before validation
    pub adjust_for_volatility: bool,
    /// Stop distance in ATRs
    pub atr_multiplier: f64,
    /// Target distance as a multiple of the stop distance
    pub target_ratio: f64,
    pub atr_period: usize,
    pub min_risk_reward: f64,
    /// Fraction of the balance lost if the stop is hit
    pub max_risk_fraction: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            adjust_for_volatility: false,
            atr_multiplier: 2.0,
            target_ratio: 1.5,
            atr_period: 14,
            min_risk_reward: 1.5,
            max_risk_fraction: dec!(0.02),
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.atr_multiplier <= 0.0 || self.target_ratio <= 0.0 {
            return Err(StrategyError::InvalidConfig(
                "ATR multiplier and target ratio must be positive".into(),
            ));
        }
        if self.atr_period == 0 {
            return Err(StrategyError::InvalidConfig(
                "ATR period must be greater than 0".into(),
            ));
        }
        if self.min_risk_reward <= 0.0 {
            return Err(StrategyError::InvalidConfig(
                "min_risk_reward must be positive".into(),
            ));
        }
        if self.max_risk_fraction <= Decimal::ZERO || self.max_risk_fraction > Decimal::ONE {
            return Err(StrategyError::InvalidConfig(
                "max_risk_fraction must be within (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Outcome of the risk filter. Rejection is a filtering decision, not an
/// error.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskDecision {
    Accepted { signal: Signal, risk_reward: f64 },
    Rejected { signal: Signal, reason: String },
}

impl RiskDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RiskDecision::Accepted { .. })
    }

    pub fn signal(&self) -> &Signal {
        match self {
            RiskDecision::Accepted { signal, .. } | RiskDecision::Rejected { signal, .. } => signal,
        }
    }

    pub fn accepted(self) -> Option<Signal> {
        match self {
            RiskDecision::Accepted { signal, .. } => Some(signal),
            RiskDecision::Rejected { .. } => None,
        }
    }
}

/// Composes the volatility adjuster, reward validator and position sizer.
#[derive(Debug, Clone)]
pub struct RiskFilter {
    config: RiskConfig,
    adjuster: Option<VolatilityAdjuster>,
    validator: RewardValidator,
    sizer: PositionSizer,
    telemetry: Telemetry,
}

impl RiskFilter {
    pub fn new(config: RiskConfig, telemetry: Telemetry) -> Result<Self, StrategyError> {
        config.validate()?;
        let adjuster = if config.adjust_for_volatility {
            Some(
                VolatilityAdjuster::new(config.atr_period, config.atr_multiplier, config.target_ratio)
                    .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?,
            )
        } else {
            None
        };
        Ok(Self {
            validator: RewardValidator::new(config.min_risk_reward, telemetry.clone()),
            sizer: PositionSizer::new(config.max_risk_fraction),
            adjuster,
            config,
            telemetry,
        })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Steps 1 and 2: optional re-levelling, then the reward check.
    /// `candles` is the history of the signal's timeframe.
    pub fn screen(&self, signal: Signal, candles: &[Candle]) -> RiskDecision {
        let signal = match &self.adjuster {
            Some(adjuster) => adjuster.adjust(signal, candles),
            None => signal,
        };

        let risk_reward = RewardValidator::risk_reward(&signal);
        if self.validator.check(&signal) {
            debug!(
                parent: self.telemetry.span(),
                symbol = %signal.symbol,
                risk_reward,
                "Signal passed risk screen"
            );
            RiskDecision::Accepted {
                signal,
                risk_reward,
            }
        } else {
            self.telemetry.record(PipelineEvent::Rejected);
            RiskDecision::Rejected {
                reason: format!(
                    "risk/reward {:.2} below minimum {:.2}",
                    risk_reward,
                    self.validator.min_risk_reward()
                ),
                signal,
            }
        }
    }

    /// Step 3: set the position size from the current balance.
    pub fn size(&self, mut signal: Signal, balance: Decimal) -> Signal {
        signal.position_size = self.sizer.size(&signal, balance);
        signal
    }

    /// All three steps.
    pub fn evaluate(&self, signal: Signal, candles: &[Candle], balance: Decimal) -> RiskDecision {
        match self.screen(signal, candles) {
            RiskDecision::Accepted {
                signal,
                risk_reward,
            } => RiskDecision::Accepted {
                signal: self.size(signal, balance),
                risk_reward,
            },
            rejected => rejected,
        }
    }
}
