//! # Pricing Capabilities
//!
//! Narrow interfaces to the collaborators the valuer consumes. Implementations
//! live in the driving service; calls are synchronous and the caller owns any
//! timeouts around them.

use std::collections::HashMap;

use crate::constants::DEFAULT_DISPLAY_DECIMALS;
use crate::errors::CoreResult;
use crate::types::PoolState;

/// USD price lookups for token symbols
pub trait PriceFeed {
    /// USD price of a token, if the feed has one
    fn lookup_usd_price(&self, symbol: &str) -> Option<f64>;

    /// Stablecoins are valued at exactly 1.0 without consulting the feed
    fn is_stablecoin(&self, symbol: &str) -> bool;

    /// Exchange-supplied display precision for amounts of this token
    fn display_decimals(&self, _symbol: &str) -> u8 {
        DEFAULT_DISPLAY_DECIMALS
    }
}

/// Pool state reads for a (network, pool address) pair
pub trait PoolStateReader {
    fn read_pool(&self, network: &str, pool_address: &str) -> CoreResult<PoolState>;
}

/// Maps on-chain token symbols to the symbols price sources quote
///
/// Built once at service start and immutable thereafter. Lookups are
/// case-insensitive; unmapped symbols resolve to their upper-cased form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSymbolMap {
    aliases: HashMap<String, String>,
}

impl TokenSymbolMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let aliases = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_uppercase(), v.as_ref().to_uppercase()))
            .collect();
        Self { aliases }
    }

    /// Load from a JSON object of `{"WETH": "ETH", ...}`
    #[cfg(feature = "client")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self::from_pairs(raw))
    }

    /// Price-source symbol for an on-chain symbol
    pub fn resolve(&self, symbol: &str) -> String {
        let key = symbol.to_uppercase();
        match self.aliases.get(&key) {
            Some(mapped) => mapped.clone(),
            None => key,
        }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
