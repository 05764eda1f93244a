//! Priced position snapshot produced by the valuer.

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Whether the snapshot carries USD values
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub enum ValuationStatus {
    /// Both legs priced in USD
    Priced,
    /// A non-stablecoin leg had no price; only pool ratios are reported
    RatioOnly { missing_symbol: String },
}

/// Immutable valuation of one position at one point in time
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct PositionSnapshot {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub token0_decimals: u8,
    pub token1_decimals: u8,

    /// Human-readable token amounts
    pub token0_amount: f64,
    pub token1_amount: f64,

    /// Pool price (token1 per token0), decimal adjusted
    pub price: f64,
    pub price_lower: f64,
    pub price_upper: f64,

    pub price_usd0: Option<f64>,
    pub price_usd1: Option<f64>,
    pub position_value_usd: Option<f64>,
    pub token0_pct: Option<f64>,
    pub token1_pct: Option<f64>,

    /// Token0-equivalent directional exposure
    pub delta: f64,
    pub in_range: bool,
    pub valuation: ValuationStatus,
}

impl PositionSnapshot {
    pub fn is_priced(&self) -> bool {
        self.valuation == ValuationStatus::Priced
    }

    /// Position holds no liquidity
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0
    }

    /// USD value of the delta exposure, if priced
    pub fn delta_value_usd(&self) -> Option<f64> {
        self.price_usd0.map(|price| self.delta * price)
    }
}
