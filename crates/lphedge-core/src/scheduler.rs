//! # Rebalance Scheduler
//!
//! Timing discipline around the hedge policy. A decision that triggers still
//! has to clear the cooldown unless it is forced; state only moves forward
//! once the executor has acknowledged the trade.

use crate::constants::SECONDS_PER_HOUR;
use crate::errors::CoreResult;
use crate::math::hours_to_whole_secs;
use crate::types::{HedgeConfig, HedgeDecision, HedgeInstruction, HedgeState, PositionSnapshot, Timestamp};

/// Result of gating a decision through the cooldown
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledAction {
    /// Policy did not trigger
    Idle,
    /// Policy triggered but the last rebalance is too recent
    CoolingDown { remaining_secs: f64 },
    /// Hand this instruction to the executor
    Execute(HedgeInstruction),
}

/// Cooldown gate and hedge state transitions
#[derive(Debug, Clone, Copy, Default)]
pub struct RebalanceScheduler;

impl RebalanceScheduler {
    /// forced OR never rebalanced OR elapsed >= cooldown
    ///
    /// The cooldown is rounded to whole seconds before comparing, so
    /// `last + cooldown_hours` is always executable.
    pub fn can_execute(now: Timestamp, last_rebalance_at: Option<Timestamp>, cooldown_hours: f64, is_forced: bool) -> bool {
        if is_forced {
            return true;
        }
        match last_rebalance_at {
            None => true,
            Some(last) => elapsed_secs(now, last) >= hours_to_whole_secs(cooldown_hours),
        }
    }

    /// Seconds left before a non-forced rebalance may run
    pub fn remaining_cooldown(now: Timestamp, last_rebalance_at: Option<Timestamp>, cooldown_hours: f64) -> f64 {
        match last_rebalance_at {
            None => 0.0,
            Some(last) => (hours_to_whole_secs(cooldown_hours) - elapsed_secs(now, last)).max(0) as f64,
        }
    }

    /// Turn a policy decision into the action the caller should take now
    pub fn gate(
        decision: &HedgeDecision,
        config: &HedgeConfig,
        state: &HedgeState,
        snapshot: &PositionSnapshot,
        position_id: &str,
        now: Timestamp,
    ) -> ScheduledAction {
        if !decision.should_trigger {
            return ScheduledAction::Idle;
        }

        let cooldown_hours = config.rebalance_cooldown_hours;
        if !Self::can_execute(now, state.last_rebalance_at, cooldown_hours, decision.is_forced) {
            let remaining_secs = Self::remaining_cooldown(now, state.last_rebalance_at, cooldown_hours);
            log::debug!(
                "{}: rebalance to {:.3} held by cooldown ({:.0}s left)",
                position_id,
                decision.target_ratio,
                remaining_secs
            );
            return ScheduledAction::CoolingDown { remaining_secs };
        }

        ScheduledAction::Execute(Self::instruction(decision, config, state, snapshot, position_id))
    }

    /// Build the executor instruction for a triggered decision
    pub fn instruction(
        decision: &HedgeDecision,
        config: &HedgeConfig,
        state: &HedgeState,
        snapshot: &PositionSnapshot,
        position_id: &str,
    ) -> HedgeInstruction {
        let target_ratio = decision.target_ratio;
        let previous_ratio = state.current_hedge_ratio;

        let (token0_delta_to_hedge, token0_adjustment) = if config.hedge_token0 {
            (target_ratio * snapshot.delta, (target_ratio - previous_ratio) * snapshot.delta)
        } else {
            (0.0, 0.0)
        };
        let token1_amount_context = if config.hedge_token1 { snapshot.token1_amount } else { 0.0 };

        HedgeInstruction {
            position_id: position_id.to_string(),
            target_ratio,
            previous_ratio,
            token0_delta_to_hedge,
            token0_adjustment,
            token1_amount_context,
            forced: decision.is_forced,
        }
    }

    /// Apply an acknowledged execution
    ///
    /// Must not be called for failed or timed-out executions; the next cycle
    /// recomputes from the unchanged state instead.
    pub fn record_execution(state: &mut HedgeState, now: Timestamp, instruction: &HedgeInstruction) {
        state.last_rebalance_at = Some(now);
        state.current_hedge_ratio = instruction.target_ratio;
    }

    /// Append a price sample and evict samples older than the lookback
    pub fn observe_price(state: &mut HedgeState, now: Timestamp, price: f64, lookback_hours: f64) -> CoreResult<()> {
        state.price_window.observe(now, price, lookback_hours * SECONDS_PER_HOUR)
    }
}

fn elapsed_secs(now: Timestamp, last: Timestamp) -> i64 {
    if now < last {
        log::warn!("clock skew: now {} is before last rebalance {}", now, last);
    }
    now.saturating_sub(last).max(0)
}
