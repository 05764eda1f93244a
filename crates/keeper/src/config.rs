use std::collections::{HashMap, HashSet};
use std::fs;

use lphedge_core::{HedgeConfig, ProfileTable, RawPosition, DEFAULT_STABLECOINS};
use serde::{Deserialize, Serialize};

use crate::error::{KeeperError, KeeperResult};

/// Keeper configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeeperConfig {
    /// Seconds between evaluation cycles
    pub interval_secs: u64,

    /// Maximum time to wait for the executor to acknowledge a rebalance
    pub execution_timeout_ms: u64,

    /// JSON market snapshot (pool states and prices) written by an indexer
    #[serde(default)]
    pub snapshot_path: Option<String>,

    /// JSON file holding hedge state between runs; required for `--once`
    #[serde(default)]
    pub state_path: Option<String>,

    /// JSON table mapping on-chain symbols to price-source symbols
    #[serde(default)]
    pub token_map_path: Option<String>,

    /// Symbols valued at exactly 1.0 USD
    #[serde(default = "default_stablecoins")]
    pub stablecoins: Vec<String>,

    /// Fallback USD prices; snapshot prices take precedence
    #[serde(default)]
    pub prices: HashMap<String, f64>,

    /// Exchange display precision per symbol
    #[serde(default)]
    pub display_decimals: HashMap<String, u8>,

    /// Dynamic profile coefficients
    #[serde(default)]
    pub profiles: ProfileTable,

    /// Positions to monitor and hedge
    pub positions: Vec<PositionConfig>,
}

/// Configuration for an individual LP position
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PositionConfig {
    /// Position id used for logging and per-position state
    pub id: String,

    /// Chain the pool lives on
    pub network: String,

    pub pool_address: String,

    pub tick_lower: i32,
    pub tick_upper: i32,

    /// Raw on-chain liquidity; a decimal string since it exceeds TOML integers
    #[serde(with = "liquidity_serde")]
    pub liquidity: u128,

    pub token0_symbol: String,
    pub token1_symbol: String,
    pub token0_decimals: u8,
    pub token1_decimals: u8,

    /// Whether this position is monitored
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Hedge thresholds; missing fields take their defaults
    #[serde(default)]
    pub hedge: HedgeConfig,
}

fn default_stablecoins() -> Vec<String> {
    DEFAULT_STABLECOINS.iter().map(|s| s.to_string()).collect()
}

fn default_enabled() -> bool {
    true
}

impl KeeperConfig {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> KeeperResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| KeeperError::Io(format!("Failed to read config file {}: {}", path, e)))?;

        let config: KeeperConfig = toml::from_str(&content)
            .map_err(|e| KeeperError::SerializationError(format!("Failed to parse config file {}: {}", path, e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &str) -> KeeperResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .map_err(|e| KeeperError::Io(format!("Failed to write config file {}: {}", path, e)))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> KeeperResult<()> {
        if self.positions.is_empty() {
            return Err(KeeperError::invalid_config("positions", "empty", "at least one position"));
        }

        if self.interval_secs == 0 {
            return Err(KeeperError::invalid_config("interval_secs", 0, "greater than 0"));
        }

        if self.execution_timeout_ms == 0 {
            return Err(KeeperError::invalid_config("execution_timeout_ms", 0, "greater than 0"));
        }

        for (symbol, price) in &self.prices {
            if !(price.is_finite() && *price > 0.0) {
                return Err(KeeperError::invalid_config(&format!("prices.{}", symbol), price, "a positive price"));
            }
        }

        self.profiles.validate()?;

        for id in self.stable_token0_dynamic_positions() {
            log::warn!(
                "position {}: token0 is a stablecoin, so its price window stays flat and dynamic hedging stays neutral",
                id
            );
        }

        let mut seen = HashSet::new();
        for position in &self.positions {
            position.validate()?;
            if !seen.insert(position.id.as_str()) {
                return Err(KeeperError::invalid_config("positions.id", &position.id, "unique position ids"));
            }
        }

        Ok(())
    }

    /// Dynamic positions whose regime window would only ever see a 1.0 price
    pub fn stable_token0_dynamic_positions(&self) -> Vec<&str> {
        self.positions
            .iter()
            .filter(|p| p.hedge.use_dynamic_hedging && p.hedge.hedge_enabled)
            .filter(|p| {
                self.stablecoins
                    .iter()
                    .any(|stable| stable.eq_ignore_ascii_case(&p.token0_symbol))
            })
            .map(|p| p.id.as_str())
            .collect()
    }

    /// Enabled positions in configuration order
    pub fn enabled_positions(&self) -> Vec<&PositionConfig> {
        self.positions.iter().filter(|p| p.enabled).collect()
    }
}

impl PositionConfig {
    /// Validate position configuration
    fn validate(&self) -> KeeperResult<()> {
        for (field, value) in [
            ("id", &self.id),
            ("network", &self.network),
            ("pool_address", &self.pool_address),
            ("token0_symbol", &self.token0_symbol),
            ("token1_symbol", &self.token1_symbol),
        ] {
            if value.is_empty() {
                return Err(KeeperError::invalid_config(&format!("position.{}", field), "empty", "non-empty string"));
            }
        }

        self.raw_position().validate()?;
        self.hedge.validate()?;

        Ok(())
    }

    /// Raw position handed to the valuer
    pub fn raw_position(&self) -> RawPosition {
        RawPosition {
            tick_lower: self.tick_lower,
            tick_upper: self.tick_upper,
            liquidity: self.liquidity,
            token0_decimals: self.token0_decimals,
            token1_decimals: self.token1_decimals,
            token0_symbol: self.token0_symbol.clone(),
            token1_symbol: self.token1_symbol.clone(),
        }
    }
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            execution_timeout_ms: 10_000,
            snapshot_path: None,
            state_path: None,
            token_map_path: None,
            stablecoins: default_stablecoins(),
            prices: HashMap::new(),
            display_decimals: HashMap::new(),
            profiles: ProfileTable::default(),
            positions: vec![],
        }
    }
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            id: "weth-usdc".to_string(),
            network: "ethereum".to_string(),
            pool_address: "0x8ad599c3a0ff1de082011efddc58f1908eb6e6d8".to_string(),
            tick_lower: -200_040,
            tick_upper: -192_060,
            liquidity: 1_000_000_000_000_000,
            token0_symbol: "WETH".to_string(),
            token1_symbol: "USDC".to_string(),
            token0_decimals: 18,
            token1_decimals: 6,
            enabled: true,
            hedge: HedgeConfig::default(),
        }
    }
}

/// Create example configuration file
pub fn create_example_config(path: &str) -> KeeperResult<()> {
    let example_config = KeeperConfig {
        interval_secs: 60,
        execution_timeout_ms: 5_000,
        snapshot_path: Some("market_snapshot.json".to_string()),
        state_path: Some("keeper_state.json".to_string()),
        token_map_path: Some("token_map.json".to_string()),
        prices: HashMap::from([("ETH".to_string(), 3_000.0), ("ARB".to_string(), 0.8)]),
        display_decimals: HashMap::from([("WETH".to_string(), 4), ("USDC".to_string(), 2)]),
        positions: vec![
            PositionConfig {
                id: "weth-usdc-mainnet".to_string(),
                ..PositionConfig::default()
            },
            PositionConfig {
                id: "arb-weth-arbitrum".to_string(),
                network: "arbitrum".to_string(),
                pool_address: "0xc6f780497a95e246eb9449f5e4770916dcd6396a".to_string(),
                tick_lower: -85_000,
                tick_upper: -75_000,
                liquidity: 250_000_000_000_000_000_000,
                token0_symbol: "ARB".to_string(),
                token1_symbol: "WETH".to_string(),
                token0_decimals: 18,
                token1_decimals: 18,
                enabled: true,
                hedge: HedgeConfig {
                    use_dynamic_hedging: false,
                    static_ratio_pct: 60,
                    rebalance_cooldown_hours: 8.0,
                    ..HedgeConfig::default()
                },
            },
        ],
        ..KeeperConfig::default()
    };

    example_config.save(path)?;
    Ok(())
}

// Custom serde module for u128 liquidity
mod liquidity_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(liquidity: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&liquidity.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.trim().replace('_', "").parse::<u128>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lphedge_core::DynamicProfile;

    fn config_with_position() -> KeeperConfig {
        let mut config = KeeperConfig::default();
        config.positions.push(PositionConfig::default());
        config
    }

    #[test]
    fn test_config_validation() {
        let mut config = config_with_position();
        assert!(config.validate().is_ok());

        config.interval_secs = 0;
        assert!(config.validate().is_err());

        assert!(KeeperConfig::default().validate().is_err());
    }

    #[test]
    fn test_position_validation() {
        let mut config = config_with_position();
        config.positions[0].tick_upper = config.positions[0].tick_lower;
        assert!(matches!(config.validate(), Err(KeeperError::Core(_))));

        let mut config = config_with_position();
        config.positions.push(PositionConfig::default());
        let err = config.validate().unwrap_err();
        assert!(format!("{}", err).contains("unique position ids"));

        let mut config = config_with_position();
        config.positions[0].hedge.static_ratio_pct = 150;
        assert!(config.validate().is_err());

        let mut config = config_with_position();
        config.prices.insert("ETH".into(), -1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
            interval_secs = 30
            execution_timeout_ms = 2000

            [[positions]]
            id = "eth"
            network = "ethereum"
            pool_address = "0xpool"
            tick_lower = -1000
            tick_upper = 1000
            liquidity = "340282366920938463463374607431768211455"
            token0_symbol = "WETH"
            token1_symbol = "USDC"
            token0_decimals = 18
            token1_decimals = 6

            [positions.hedge]
            dynamic_profile = "volatility_adaptive"
            rebalance_cooldown_hours = 2.0
        "#;

        let config: KeeperConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());

        let position = &config.positions[0];
        assert_eq!(position.liquidity, u128::MAX);
        assert!(position.enabled);
        assert_eq!(position.hedge.dynamic_profile, DynamicProfile::VolatilityAdaptive);
        assert_eq!(position.hedge.rebalance_cooldown_hours, 2.0);
        // Unspecified hedge fields fall back to defaults
        assert_eq!(position.hedge.lookback_hours, HedgeConfig::default().lookback_hours);
        assert_eq!(config.stablecoins, default_stablecoins());
        assert_eq!(config.profiles, ProfileTable::default());
        assert_eq!(config.state_path, None);
    }

    #[test]
    fn test_example_config_round_trip() {
        let path = std::env::temp_dir().join(format!("lphedge-keeper-example-{}.toml", std::process::id()));
        let path = path.to_string_lossy().to_string();

        create_example_config(&path).unwrap();
        let loaded = KeeperConfig::load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.positions.len(), 2);
        assert_eq!(loaded.positions[1].liquidity, 250_000_000_000_000_000_000);
        assert_eq!(loaded.positions[1].hedge.static_ratio_pct, 60);
        assert_eq!(loaded.enabled_positions().len(), 2);
        assert_eq!(loaded.prices.get("ETH"), Some(&3_000.0));
        assert_eq!(loaded.state_path.as_deref(), Some("keeper_state.json"));
    }

    #[test]
    fn test_stable_token0_dynamic_positions() {
        let mut config = config_with_position();
        config.positions.push(PositionConfig {
            id: "usdc-weth".into(),
            token0_symbol: "usdc".into(),
            token1_symbol: "WETH".into(),
            token0_decimals: 6,
            token1_decimals: 18,
            ..PositionConfig::default()
        });
        config.positions.push(PositionConfig {
            id: "usdc-weth-static".into(),
            token0_symbol: "USDC".into(),
            hedge: HedgeConfig { use_dynamic_hedging: false, ..HedgeConfig::default() },
            ..PositionConfig::default()
        });

        assert_eq!(config.stable_token0_dynamic_positions(), vec!["usdc-weth"]);
        // Flagged, not rejected
        assert!(config.validate().is_ok());
    }
}
