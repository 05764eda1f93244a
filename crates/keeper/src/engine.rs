//! Per-cycle hedge evaluation across all configured positions.
//!
//! Each position owns one hedge state behind an async mutex. An evaluation
//! holds that lock from valuation through execution acknowledgement, so a
//! second evaluation of the same position started meanwhile is skipped rather
//! than queued. Positions are evaluated concurrently with each other.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use lphedge_core::{
    CoreError, HedgeDecision, HedgeInstruction, HedgeRatioPolicy, HedgeState, PoolStateReader, PositionValuer,
    PriceFeed, RebalanceScheduler, ScheduledAction, Timestamp,
};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::collaborators::{ConfigStore, ExecutionReport, HedgeExecutor};
use crate::error::{KeeperError, KeeperResult};

/// Why a position was not evaluated this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another evaluation of this position holds its state
    InFlight,
    Disabled,
}

/// What happened to one position in one cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    /// Policy did not trigger
    Held(HedgeDecision),
    CoolingDown { decision: HedgeDecision, remaining_secs: f64 },
    Executed { instruction: HedgeInstruction, report: ExecutionReport },
}

/// Outcome counts for one cycle, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub executed: usize,
    pub held: usize,
    pub cooling_down: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl CycleSummary {
    pub fn from_results(results: &[(String, KeeperResult<CycleOutcome>)]) -> Self {
        let mut summary = Self::default();
        for (_, result) in results {
            match result {
                Ok(CycleOutcome::Executed { .. }) => summary.executed += 1,
                Ok(CycleOutcome::Held(_)) => summary.held += 1,
                Ok(CycleOutcome::CoolingDown { .. }) => summary.cooling_down += 1,
                Ok(CycleOutcome::Skipped(_)) => summary.skipped += 1,
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Drives valuation, policy, cooldown gate and execution for every position
pub struct HedgeEngine {
    store: Arc<dyn ConfigStore>,
    executor: Arc<dyn HedgeExecutor>,
    policy: HedgeRatioPolicy,
    execution_timeout: Duration,
    states: Mutex<HashMap<String, Arc<Mutex<HedgeState>>>>,
}

impl HedgeEngine {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        executor: Arc<dyn HedgeExecutor>,
        policy: HedgeRatioPolicy,
        execution_timeout: Duration,
    ) -> Self {
        Self {
            store,
            executor,
            policy,
            execution_timeout,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluate every configured position against this cycle's market data
    pub async fn run_cycle<M>(&self, market: &M, now: Timestamp) -> Vec<(String, KeeperResult<CycleOutcome>)>
    where
        M: PoolStateReader + PriceFeed,
    {
        let ids = self.store.position_ids();
        let results = join_all(ids.iter().map(|id| self.evaluate_position(id, market, now))).await;

        ids.into_iter()
            .zip(results)
            .inspect(|(id, result)| {
                if let Err(e) = result {
                    log::error!("Failed to evaluate position {}: {}", id, e);
                }
            })
            .collect()
    }

    /// Evaluate a single position; state changes only on acknowledged execution
    pub async fn evaluate_position<M>(&self, position_id: &str, market: &M, now: Timestamp) -> KeeperResult<CycleOutcome>
    where
        M: PoolStateReader + PriceFeed,
    {
        let config = self
            .store
            .position(position_id)
            .ok_or_else(|| KeeperError::UnknownPosition(position_id.to_string()))?;
        if !config.enabled {
            return Ok(CycleOutcome::Skipped(SkipReason::Disabled));
        }

        let handle = self.state_handle(position_id).await;
        let Ok(mut state) = handle.try_lock_owned() else {
            log::debug!("{}: evaluation already in flight, skipping", position_id);
            return Ok(CycleOutcome::Skipped(SkipReason::InFlight));
        };

        let snapshot = PositionValuer::new(market).value_from_reader(
            market,
            &config.network,
            &config.pool_address,
            &config.raw_position(),
        )?;

        if let Some(price) = snapshot.price_usd0 {
            match RebalanceScheduler::observe_price(&mut state, now, price, config.hedge.lookback_hours) {
                Ok(()) => {}
                Err(CoreError::StaleData) => {
                    log::warn!("{}: price sample at {} is not newer than the window, ignored", position_id, now)
                }
                Err(e) => return Err(e.into()),
            }
        }

        let decision = self.policy.evaluate(&config.hedge, &state, &snapshot);
        if let Some(err) = decision.valuation_error() {
            log::warn!("{}: {}; no hedge adjustment this cycle", position_id, err);
        }
        log::debug!(
            "{}: value={:?} delta={:.6} target={:.3} current={:.3} drift={:.3} regime={:?} trigger={} forced={}",
            position_id,
            snapshot.position_value_usd,
            snapshot.delta,
            decision.target_ratio,
            state.current_hedge_ratio,
            decision.drift,
            decision.regime,
            decision.should_trigger,
            decision.is_forced
        );

        let instruction = match RebalanceScheduler::gate(&decision, &config.hedge, &state, &snapshot, position_id, now) {
            ScheduledAction::Idle => return Ok(CycleOutcome::Held(decision)),
            ScheduledAction::CoolingDown { remaining_secs } => {
                return Ok(CycleOutcome::CoolingDown { decision, remaining_secs })
            }
            ScheduledAction::Execute(instruction) => instruction,
        };

        let report = match timeout(self.execution_timeout, self.executor.execute(&instruction)).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                log::warn!("{}: execution failed, state unchanged: {}", position_id, e);
                return Err(e);
            }
            Err(_) => {
                log::warn!("{}: execution timed out, state unchanged", position_id);
                return Err(KeeperError::Timeout {
                    position_id: position_id.to_string(),
                    timeout_ms: self.execution_timeout.as_millis() as u64,
                });
            }
        };

        RebalanceScheduler::record_execution(&mut state, now, &instruction);
        log::info!(
            "{}: rebalanced to hedge ratio {:.3} (from {:.3}){} ref={}",
            position_id,
            instruction.target_ratio,
            instruction.previous_ratio,
            if instruction.forced { " [forced]" } else { "" },
            report.reference
        );

        Ok(CycleOutcome::Executed { instruction, report })
    }

    /// Copy of a position's hedge state, if it has been evaluated
    pub async fn state(&self, position_id: &str) -> Option<HedgeState> {
        let handle = self.states.lock().await.get(position_id).cloned()?;
        let state = handle.lock().await;
        Some(state.clone())
    }

    /// Seed hedge state from a previous run; ids no longer configured are dropped
    pub async fn restore_states(&self, saved: BTreeMap<String, HedgeState>) -> usize {
        let known: HashSet<String> = self.store.position_ids().into_iter().collect();
        let mut states = self.states.lock().await;
        let mut restored = 0;
        for (id, state) in saved {
            if !known.contains(&id) {
                log::debug!("Dropping saved hedge state for unconfigured position {}", id);
                continue;
            }
            states.insert(id, Arc::new(Mutex::new(state)));
            restored += 1;
        }
        restored
    }

    /// Copies of the hedge state of every position seen so far
    pub async fn export_states(&self) -> BTreeMap<String, HedgeState> {
        let handles: Vec<_> = self
            .states
            .lock()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect();

        let mut exported = BTreeMap::new();
        for (id, handle) in handles {
            let state = handle.lock().await;
            exported.insert(id, state.clone());
        }
        exported
    }

    /// The lock guarding a position's hedge state, created on first use
    pub async fn state_handle(&self, position_id: &str) -> Arc<Mutex<HedgeState>> {
        let mut states = self.states.lock().await;
        states
            .entry(position_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(HedgeState::new())))
            .clone()
    }
}
