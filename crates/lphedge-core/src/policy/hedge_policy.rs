//! Target hedge ratio and rebalance trigger decision.
//!
//! The decision runs in a fixed order and stops at the first condition that
//! rules out a trade:
//!
//! 1. Disabled config
//! 2. No USD valuation
//! 3. Empty or zero-value position
//! 4. No eligible leg
//! 5. Drift too small relative to position value
//! 6. Drift at the forcing ceiling (cooldown bypass) or the drift threshold
//!
//! The capital floor runs before the forcing ceiling: a large ratio drift on
//! a position whose hedge leg is a small share of its value is held, not forced.

use crate::oracle::PriceWindow;
use crate::policy::profiles::ProfileTable;
use crate::types::{
    DecisionCondition, HedgeConfig, HedgeDecision, HedgeMode, HedgeState, MarketRegime, PositionSnapshot,
    ValuationStatus,
};

/// Stateless hedge policy over a tunable profile table
#[derive(Debug, Clone, Default)]
pub struct HedgeRatioPolicy {
    profiles: ProfileTable,
}

impl HedgeRatioPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: ProfileTable) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    /// Fresh target ratio for the active mode, and the regime it was derived from
    pub fn target_ratio(&self, config: &HedgeConfig, window: &PriceWindow) -> (f64, Option<MarketRegime>) {
        match config.mode() {
            HedgeMode::Disabled => (0.0, None),
            HedgeMode::StaticRatio(pct) => (f64::from(pct.min(100)) / 100.0, None),
            HedgeMode::Dynamic(profile) => {
                let regime = window.regime(config.down_threshold_pct, config.bounce_threshold_pct);
                let realized_vol = if profile.is_volatility_aware() {
                    window.realized_volatility().unwrap_or(0.0)
                } else {
                    0.0
                };
                (self.profiles.get(profile).ratio(regime, realized_vol), Some(regime))
            }
        }
    }

    /// Decide whether the position should be rebalanced toward a fresh target
    pub fn evaluate(&self, config: &HedgeConfig, state: &HedgeState, snapshot: &PositionSnapshot) -> HedgeDecision {
        let mode = config.mode();
        if mode == HedgeMode::Disabled {
            return HedgeDecision::no_action(mode, 0.0, 0.0, DecisionCondition::Disabled);
        }

        let (target_ratio, regime) = self.target_ratio(config, &state.price_window);
        let drift = (target_ratio - state.current_hedge_ratio).abs();
        let hold = |condition: DecisionCondition| HedgeDecision {
            regime,
            ..HedgeDecision::no_action(mode, target_ratio, drift, condition)
        };

        let (Some(value_usd), Some(delta_value_usd)) = (snapshot.position_value_usd, snapshot.delta_value_usd())
        else {
            let symbol = match &snapshot.valuation {
                ValuationStatus::RatioOnly { missing_symbol } => missing_symbol.clone(),
                ValuationStatus::Priced => "token0".to_string(),
            };
            return hold(DecisionCondition::ValuationUnavailable { symbol });
        };

        if snapshot.is_empty() || value_usd <= 0.0 {
            return hold(DecisionCondition::EmptyPosition);
        }

        if !config.hedge_token0 && !config.hedge_token1 {
            return hold(DecisionCondition::NoEligibleLeg);
        }

        let drift_pct_of_capital = drift * delta_value_usd / value_usd;
        if drift_pct_of_capital < config.drift_min_pct_of_capital {
            return HedgeDecision {
                drift_pct_of_capital: Some(drift_pct_of_capital),
                ..hold(DecisionCondition::BelowCapitalThreshold)
            };
        }

        let is_forced = drift >= config.max_hedge_drift_pct;
        let should_trigger = is_forced || drift >= config.delta_drift_threshold_pct;

        HedgeDecision {
            mode,
            should_trigger,
            target_ratio,
            is_forced,
            drift,
            drift_pct_of_capital: Some(drift_pct_of_capital),
            regime,
            condition: (!should_trigger).then_some(DecisionCondition::BelowDriftThreshold),
        }
    }
}
