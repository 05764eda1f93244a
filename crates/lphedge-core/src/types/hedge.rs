//! Hedge configuration, per-position hedge state, and policy outputs.

use crate::constants::SECONDS_PER_HOUR;
use crate::errors::{CoreError, CoreResult};
use crate::math::hours_to_whole_secs;
use crate::oracle::PriceWindow;

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Unix timestamp in seconds
pub type Timestamp = i64;

/// Dynamic hedging profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(rename_all = "snake_case"))]
pub enum DynamicProfile {
    #[default]
    Balanced,
    WhisperDynamic,
    AggressiveUpside,
    AggressiveDownside,
    VolatilityAdaptive,
}

impl DynamicProfile {
    pub const ALL: [DynamicProfile; 5] = [
        DynamicProfile::Balanced,
        DynamicProfile::WhisperDynamic,
        DynamicProfile::AggressiveUpside,
        DynamicProfile::AggressiveDownside,
        DynamicProfile::VolatilityAdaptive,
    ];

    /// Profiles whose ratio also scales with realized volatility
    pub fn is_volatility_aware(&self) -> bool {
        matches!(self, Self::WhisperDynamic | Self::VolatilityAdaptive)
    }
}

/// Per-position hedge configuration, resolved to numeric thresholds
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(default))]
pub struct HedgeConfig {
    pub hedge_enabled: bool,
    /// Legs eligible for hedging
    pub hedge_token0: bool,
    pub hedge_token1: bool,

    pub use_dynamic_hedging: bool,
    /// Fixed hedge ratio (0-100) used when dynamic hedging is off
    pub static_ratio_pct: u8,
    pub dynamic_profile: DynamicProfile,

    /// Minimum time between executed rebalances
    pub rebalance_cooldown_hours: f64,
    /// Minimum ratio drift for a non-forced rebalance
    pub delta_drift_threshold_pct: f64,
    /// Drawdown at or below this fraction is a downtrend (e.g. -0.065)
    pub down_threshold_pct: f64,
    /// Recovery to at least this fraction after a drawdown is a bounce (e.g. -0.03)
    pub bounce_threshold_pct: f64,
    /// Price history window length
    pub lookback_hours: f64,
    /// Minimum drift, as a fraction of position value, worth trading
    pub drift_min_pct_of_capital: f64,
    /// Drift at which a rebalance is forced regardless of cooldown
    pub max_hedge_drift_pct: f64,
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            hedge_enabled: true,
            hedge_token0: true,
            hedge_token1: false,
            use_dynamic_hedging: true,
            static_ratio_pct: 50,
            dynamic_profile: DynamicProfile::Balanced,
            rebalance_cooldown_hours: 4.0,
            delta_drift_threshold_pct: 0.05,
            down_threshold_pct: -0.065,
            bounce_threshold_pct: -0.03,
            lookback_hours: 24.0,
            drift_min_pct_of_capital: 0.01,
            max_hedge_drift_pct: 0.25,
        }
    }
}

impl HedgeConfig {
    /// Resolve the single active hedging mode
    pub fn mode(&self) -> HedgeMode {
        if !self.hedge_enabled {
            HedgeMode::Disabled
        } else if self.use_dynamic_hedging {
            HedgeMode::Dynamic(self.dynamic_profile)
        } else {
            HedgeMode::StaticRatio(self.static_ratio_pct)
        }
    }

    /// Cooldown in whole seconds, the unit the scheduler compares in
    pub fn cooldown_secs(&self) -> i64 {
        hours_to_whole_secs(self.rebalance_cooldown_hours)
    }

    pub fn lookback_secs(&self) -> f64 {
        self.lookback_hours * SECONDS_PER_HOUR
    }

    /// Validate numeric ranges
    pub fn validate(&self) -> CoreResult<()> {
        if self.static_ratio_pct > 100 {
            return Err(CoreError::invalid_config("static_ratio_pct", self.static_ratio_pct, "at most 100"));
        }

        if !(self.rebalance_cooldown_hours > 0.0 && self.rebalance_cooldown_hours.is_finite()) {
            return Err(CoreError::invalid_config(
                "rebalance_cooldown_hours",
                self.rebalance_cooldown_hours,
                "greater than 0",
            ));
        }

        if !(self.lookback_hours > 0.0 && self.lookback_hours.is_finite()) {
            return Err(CoreError::invalid_config("lookback_hours", self.lookback_hours, "greater than 0"));
        }

        for (field, value) in [
            ("delta_drift_threshold_pct", self.delta_drift_threshold_pct),
            ("drift_min_pct_of_capital", self.drift_min_pct_of_capital),
            ("max_hedge_drift_pct", self.max_hedge_drift_pct),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(CoreError::invalid_config(field, value, "within (0, 1)"));
            }
        }

        for (field, value) in [
            ("down_threshold_pct", self.down_threshold_pct),
            ("bounce_threshold_pct", self.bounce_threshold_pct),
        ] {
            if !(value < 0.0 && value > -1.0) {
                return Err(CoreError::invalid_config(field, value, "a negative fraction within (-1, 0)"));
            }
        }

        if self.bounce_threshold_pct.abs() >= self.down_threshold_pct.abs() {
            log::warn!(
                "bounce_threshold_pct {} is not smaller in magnitude than down_threshold_pct {}; bounces will never register",
                self.bounce_threshold_pct,
                self.down_threshold_pct
            );
        }

        if self.max_hedge_drift_pct <= self.delta_drift_threshold_pct {
            log::warn!(
                "max_hedge_drift_pct {} <= delta_drift_threshold_pct {}; every rebalance will be forced",
                self.max_hedge_drift_pct,
                self.delta_drift_threshold_pct
            );
        }

        Ok(())
    }
}

/// Active hedging mode; exactly one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum HedgeMode {
    Disabled,
    StaticRatio(u8),
    Dynamic(DynamicProfile),
}

/// Price-move classification over the lookback window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum MarketRegime {
    /// No drawdown past the down threshold
    Neutral,
    /// Drawdown past the down threshold without sufficient recovery
    Downtrend,
    /// Drawdown past the down threshold followed by recovery past the bounce threshold
    Bounce,
}

/// Mutable hedge state for one position
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct HedgeState {
    pub last_rebalance_at: Option<Timestamp>,
    /// Last applied ratio; distinct from the policy's fresh target
    pub current_hedge_ratio: f64,
    pub price_window: PriceWindow,
}

impl HedgeState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Why a decision did not trigger
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum DecisionCondition {
    Disabled,
    NoEligibleLeg,
    /// No reliable USD valuation; nothing is traded
    ValuationUnavailable { symbol: String },
    EmptyPosition,
    BelowCapitalThreshold,
    BelowDriftThreshold,
}

/// Output of one policy evaluation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct HedgeDecision {
    pub mode: HedgeMode,
    pub should_trigger: bool,
    pub target_ratio: f64,
    /// Drift reached the hard ceiling; cooldown does not apply
    pub is_forced: bool,
    pub drift: f64,
    pub drift_pct_of_capital: Option<f64>,
    pub regime: Option<MarketRegime>,
    pub condition: Option<DecisionCondition>,
}

impl HedgeDecision {
    /// A non-triggering decision for the given reason
    pub fn no_action(mode: HedgeMode, target_ratio: f64, drift: f64, condition: DecisionCondition) -> Self {
        Self {
            mode,
            should_trigger: false,
            target_ratio,
            is_forced: false,
            drift,
            drift_pct_of_capital: None,
            regime: None,
            condition: Some(condition),
        }
    }

    /// The degraded-valuation condition as an error, for callers that log or alert on it
    pub fn valuation_error(&self) -> Option<CoreError> {
        match &self.condition {
            Some(DecisionCondition::ValuationUnavailable { symbol }) => {
                Some(CoreError::ValuationUnavailable { symbol: symbol.clone() })
            }
            _ => None,
        }
    }
}

/// Target hedge handed to the external execution collaborator
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct HedgeInstruction {
    pub position_id: String,
    pub target_ratio: f64,
    pub previous_ratio: f64,
    /// Token0 amount that should be hedged at the target ratio
    pub token0_delta_to_hedge: f64,
    /// Signed change in hedged token0 relative to the applied ratio
    pub token0_adjustment: f64,
    pub token1_amount_context: f64,
    pub forced: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(HedgeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_mode_resolution() {
        let mut config = HedgeConfig::default();
        assert_eq!(config.mode(), HedgeMode::Dynamic(DynamicProfile::Balanced));

        config.use_dynamic_hedging = false;
        config.static_ratio_pct = 70;
        assert_eq!(config.mode(), HedgeMode::StaticRatio(70));

        config.hedge_enabled = false;
        assert_eq!(config.mode(), HedgeMode::Disabled);
    }

    #[test]
    fn test_config_validation() {
        let mut config = HedgeConfig::default();
        config.static_ratio_pct = 101;
        assert!(config.validate().is_err());

        let mut config = HedgeConfig::default();
        config.rebalance_cooldown_hours = 0.0;
        assert!(config.validate().is_err());

        let mut config = HedgeConfig::default();
        config.lookback_hours = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = HedgeConfig::default();
        config.max_hedge_drift_pct = 1.0;
        assert!(config.validate().is_err());

        let mut config = HedgeConfig::default();
        config.down_threshold_pct = 0.05;
        assert!(config.validate().is_err());

        // Threshold ordering is only a warning
        let mut config = HedgeConfig::default();
        config.bounce_threshold_pct = -0.2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hour_conversions() {
        let config = HedgeConfig {
            rebalance_cooldown_hours: 1.5,
            lookback_hours: 24.0,
            ..HedgeConfig::default()
        };
        assert_eq!(config.cooldown_secs(), 5_400);
        assert_eq!(config.lookback_secs(), 86_400.0);
    }

    #[cfg(feature = "client")]
    #[test]
    fn test_partial_config_uses_defaults() {
        let config: HedgeConfig =
            serde_json::from_str(r#"{"dynamic_profile": "aggressive_downside", "lookback_hours": 12.0}"#).unwrap();
        assert_eq!(config.mode(), HedgeMode::Dynamic(DynamicProfile::AggressiveDownside));
        assert_eq!(config.lookback_hours, 12.0);
        assert_eq!(config.rebalance_cooldown_hours, HedgeConfig::default().rebalance_cooldown_hours);
    }

    #[test]
    fn test_valuation_error_surface() {
        let decision = HedgeDecision::no_action(
            HedgeMode::Dynamic(DynamicProfile::Balanced),
            0.5,
            0.5,
            DecisionCondition::ValuationUnavailable { symbol: "PEPE".into() },
        );
        assert_eq!(
            decision.valuation_error(),
            Some(CoreError::ValuationUnavailable { symbol: "PEPE".into() })
        );
    }
}
