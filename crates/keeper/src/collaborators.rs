//! Collaborators the hedge engine talks to: configuration, execution and
//! market data.
//!
//! The market side is a file-backed snapshot written by an external indexer.
//! It is reloaded every cycle and answers both pool reads and USD price
//! lookups, so one value satisfies [`PoolStateReader`] and [`PriceFeed`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lphedge_core::math::U256;
use lphedge_core::{
    CoreError, CoreResult, HedgeInstruction, PoolState, PoolStateReader, PriceFeed, TokenSymbolMap,
    DEFAULT_DISPLAY_DECIMALS,
};
use serde::Deserialize;

use crate::config::{KeeperConfig, PositionConfig};
use crate::error::{KeeperError, KeeperResult};

// ============================================================================
// Configuration
// ============================================================================

/// Supplies per-position configuration; never written by the engine
pub trait ConfigStore: Send + Sync {
    fn position_ids(&self) -> Vec<String>;

    fn position(&self, id: &str) -> Option<PositionConfig>;
}

/// Config store over the enabled positions of a loaded [`KeeperConfig`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigStore {
    positions: BTreeMap<String, PositionConfig>,
}

impl InMemoryConfigStore {
    pub fn new(positions: impl IntoIterator<Item = PositionConfig>) -> Self {
        Self {
            positions: positions.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn from_config(config: &KeeperConfig) -> Self {
        Self::new(config.enabled_positions().into_iter().cloned())
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn position_ids(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }

    fn position(&self, id: &str) -> Option<PositionConfig> {
        self.positions.get(id).cloned()
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Acknowledgement that an instruction was carried out
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub position_id: String,
    /// Executor-side order or batch reference
    pub reference: String,
    pub executed_at: DateTime<Utc>,
}

/// Translates hedge instructions into exchange orders
///
/// `Ok` means the hedge is in place. Any error, or no answer within the
/// engine's timeout, leaves hedge state untouched.
#[async_trait]
pub trait HedgeExecutor: Send + Sync {
    async fn execute(&self, instruction: &HedgeInstruction) -> KeeperResult<ExecutionReport>;
}

/// Executor that logs instructions and acknowledges them without trading
#[derive(Debug, Default)]
pub struct DryRunExecutor {
    executed: AtomicU64,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed_count(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HedgeExecutor for DryRunExecutor {
    async fn execute(&self, instruction: &HedgeInstruction) -> KeeperResult<ExecutionReport> {
        let n = self.executed.fetch_add(1, Ordering::Relaxed) + 1;
        log::info!(
            "DRY RUN: would hedge {} at ratio {:.3} (was {:.3}): token0 target {:.6}, adjust {:+.6}{}",
            instruction.position_id,
            instruction.target_ratio,
            instruction.previous_ratio,
            instruction.token0_delta_to_hedge,
            instruction.token0_adjustment,
            if instruction.forced { " [forced]" } else { "" }
        );

        Ok(ExecutionReport {
            position_id: instruction.position_id.clone(),
            reference: format!("dry-run-{}", n),
            executed_at: Utc::now(),
        })
    }
}

// ============================================================================
// Market Data
// ============================================================================

/// On-disk snapshot format
#[derive(Debug, Deserialize)]
struct MarketSnapshotFile {
    #[serde(default)]
    pools: HashMap<String, PoolEntry>,
    #[serde(default)]
    prices: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct PoolEntry {
    /// Decimal or 0x-prefixed hex
    sqrt_price_x96: String,
    tick: i32,
}

/// Pool states and USD prices for one cycle
#[derive(Debug, Clone, Default)]
pub struct SnapshotMarket {
    symbols: TokenSymbolMap,
    stablecoins: HashSet<String>,
    display_decimals: HashMap<String, u8>,
    pools: HashMap<String, PoolState>,
    prices: HashMap<String, f64>,
}

impl SnapshotMarket {
    pub fn new(symbols: TokenSymbolMap, stablecoins: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let stablecoins = stablecoins.into_iter().map(|s| s.as_ref().to_uppercase()).collect();
        Self {
            symbols,
            stablecoins,
            ..Self::default()
        }
    }

    /// Market seeded with the static prices and precisions from config
    pub fn from_config(config: &KeeperConfig, symbols: TokenSymbolMap) -> Self {
        let mut market = Self::new(symbols, &config.stablecoins);
        for (symbol, price) in &config.prices {
            market.set_price(symbol, *price);
        }
        for (symbol, decimals) in &config.display_decimals {
            market.display_decimals.insert(symbol.to_uppercase(), *decimals);
        }
        market
    }

    /// Merge a snapshot file over the current state
    pub fn load_snapshot(&mut self, path: &str) -> KeeperResult<()> {
        let content = fs::read_to_string(path)
            .map_err(|e| KeeperError::Io(format!("Failed to read market snapshot {}: {}", path, e)))?;
        self.merge_json(&content)
    }

    pub fn merge_json(&mut self, json: &str) -> KeeperResult<()> {
        let snapshot: MarketSnapshotFile = serde_json::from_str(json)?;

        for (key, entry) in snapshot.pools {
            let sqrt_price_x96 = entry
                .sqrt_price_x96
                .parse::<U256>()
                .map_err(|e| KeeperError::SerializationError(format!("pool {}: bad sqrt_price_x96: {}", key, e)))?;
            self.pools.insert(key.to_lowercase(), PoolState::new(sqrt_price_x96, entry.tick));
        }

        for (symbol, price) in snapshot.prices {
            self.set_price(&symbol, price);
        }

        log::debug!("Market snapshot: {} pools, {} prices", self.pools.len(), self.prices.len());
        Ok(())
    }

    pub fn insert_pool(&mut self, network: &str, pool_address: &str, pool: PoolState) {
        self.pools.insert(pool_key(network, pool_address), pool);
    }

    pub fn set_price(&mut self, symbol: &str, price: f64) {
        self.prices.insert(self.symbols.resolve(symbol), price);
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }
}

impl PoolStateReader for SnapshotMarket {
    fn read_pool(&self, network: &str, pool_address: &str) -> CoreResult<PoolState> {
        let key = pool_key(network, pool_address);
        self.pools
            .get(&key)
            .copied()
            .ok_or_else(|| CoreError::pool_read(format!("no pool state for {}", key)))
    }
}

impl PriceFeed for SnapshotMarket {
    fn lookup_usd_price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(&self.symbols.resolve(symbol)).copied()
    }

    fn is_stablecoin(&self, symbol: &str) -> bool {
        self.stablecoins.contains(&symbol.to_uppercase()) || self.stablecoins.contains(&self.symbols.resolve(symbol))
    }

    fn display_decimals(&self, symbol: &str) -> u8 {
        self.display_decimals
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(DEFAULT_DISPLAY_DECIMALS)
    }
}

fn pool_key(network: &str, pool_address: &str) -> String {
    format!("{}:{}", network, pool_address).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lphedge_core::DEFAULT_STABLECOINS;

    fn instruction() -> HedgeInstruction {
        HedgeInstruction {
            position_id: "weth-usdc".into(),
            target_ratio: 0.5,
            previous_ratio: 0.0,
            token0_delta_to_hedge: 1.0,
            token0_adjustment: 1.0,
            token1_amount_context: 0.0,
            forced: true,
        }
    }

    #[test]
    fn test_config_store_only_enabled() {
        let mut config = KeeperConfig::default();
        config.positions.push(PositionConfig { id: "a".into(), ..PositionConfig::default() });
        config.positions.push(PositionConfig { id: "b".into(), enabled: false, ..PositionConfig::default() });

        let store = InMemoryConfigStore::from_config(&config);
        assert_eq!(store.position_ids(), vec!["a".to_string()]);
        assert!(store.position("b").is_none());
    }

    #[tokio::test]
    async fn test_dry_run_acknowledges() {
        let executor = DryRunExecutor::new();
        let report = executor.execute(&instruction()).await.unwrap();
        assert_eq!(report.position_id, "weth-usdc");
        assert_eq!(report.reference, "dry-run-1");
        assert_eq!(executor.executed_count(), 1);
    }

    #[test]
    fn test_snapshot_market() {
        let symbols = TokenSymbolMap::from_pairs([("WETH", "ETH")]);
        let mut market = SnapshotMarket::new(symbols, DEFAULT_STABLECOINS);
        market
            .merge_json(
                r#"{
                    "pools": {
                        "Ethereum:0xABC": { "sqrt_price_x96": "79228162514264337593543950336", "tick": 0 },
                        "arbitrum:0xdef": { "sqrt_price_x96": "0x1000000000000000000000000", "tick": 0 }
                    },
                    "prices": { "ETH": 3000.5 }
                }"#,
            )
            .unwrap();

        assert_eq!(market.pool_count(), 2);
        let pool = market.read_pool("ethereum", "0xabc").unwrap();
        assert_eq!(pool.sqrt_price_x96, U256::from(1u128 << 96));
        assert_eq!(market.read_pool("arbitrum", "0xDEF").unwrap().sqrt_price_x96, U256::from(1u128 << 96));
        assert!(matches!(market.read_pool("base", "0xabc"), Err(CoreError::PoolRead(_))));

        assert_eq!(market.lookup_usd_price("WETH"), Some(3000.5));
        assert_eq!(market.lookup_usd_price("weth"), Some(3000.5));
        assert!(market.is_stablecoin("usdc"));
        assert!(!market.is_stablecoin("WETH"));
        assert_eq!(market.display_decimals("WETH"), DEFAULT_DISPLAY_DECIMALS);
    }

    #[test]
    fn test_snapshot_prices_override_config() {
        let mut config = KeeperConfig::default();
        config.prices.insert("ARB".into(), 0.8);
        config.display_decimals.insert("arb".into(), 2);

        let mut market = SnapshotMarket::from_config(&config, TokenSymbolMap::new());
        assert_eq!(market.lookup_usd_price("ARB"), Some(0.8));
        assert_eq!(market.display_decimals("ARB"), 2);

        market.merge_json(r#"{ "prices": { "arb": 0.75 } }"#).unwrap();
        assert_eq!(market.lookup_usd_price("ARB"), Some(0.75));

        assert!(market.merge_json(r#"{ "pools": { "x:y": { "sqrt_price_x96": "nope", "tick": 0 } } }"#).is_err());
    }
}
