//! Risk filtering for confirmed signals.
//!
//! Applied in order: optional volatility re-levelling of stop and target,
//! risk/reward validation, then position sizing.

mod position_sizer;
mod reward;
mod risk_filter;
mod volatility;

pub use position_sizer::PositionSizer;
pub use reward::RewardValidator;
pub use risk_filter::{RiskConfig, RiskDecision, RiskFilter};
pub use volatility::VolatilityAdjuster;
