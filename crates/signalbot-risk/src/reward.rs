//! Risk/reward validation.

use signalbot_core::types::Signal;
use signalbot_core::Telemetry;
use tracing::info;

/// Slack for ratios that land a rounding error below the minimum, as
/// 3 ATR / 2 ATR can.
const RATIO_TOLERANCE: f64 = 1e-9;

/// Accepts signals whose reward/risk ratio reaches a minimum.
///
/// The comparison allows `RATIO_TOLERANCE` of slack, so a ratio in
/// `[min - 1e-9, min)` is accepted as `min`. Without it the default
/// 3 ATR / 2 ATR levels can compute to just under 1.5 and be rejected.
#[derive(Debug, Clone)]
pub struct RewardValidator {
    min_risk_reward: f64,
    telemetry: Telemetry,
}

impl RewardValidator {
    pub fn new(min_risk_reward: f64, telemetry: Telemetry) -> Self {
        Self {
            min_risk_reward,
            telemetry,
        }
    }

    pub fn min_risk_reward(&self) -> f64 {
        self.min_risk_reward
    }

    /// Reward over risk in the signal's direction; 0 when risk is not positive.
    pub fn risk_reward(signal: &Signal) -> f64 {
        let risk = signal.risk_per_unit();
        if risk <= 0.0 {
            return 0.0;
        }
        signal.reward_per_unit() / risk
    }

    /// Whether the signal meets the minimum ratio. Rejections are logged.
    pub fn check(&self, signal: &Signal) -> bool {
        let ratio = Self::risk_reward(signal);
        let accepted = ratio > 0.0 && ratio + RATIO_TOLERANCE >= self.min_risk_reward;
        if !accepted {
            info!(
                parent: self.telemetry.span(),
                symbol = %signal.symbol,
                signal_type = %signal.signal_type,
                risk_reward = ratio,
                minimum = self.min_risk_reward,
                "Signal rejected on risk/reward"
            );
        }
        accepted
    }
}
