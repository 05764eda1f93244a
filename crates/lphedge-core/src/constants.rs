//! # Constants
//!
//! - Fixed-point scale factors (Q96)
//! - Uniswap V3 tick bounds
//! - Display rounding precisions
//! - Time conversions

// ============================================================================
// Mathematical Constants
// ============================================================================

/// Q96 fixed-point scale factor: 2^96
pub const Q96: u128 = 1u128 << 96;

/// Q96 as a float, for display-precision conversions
pub const Q96_F64: f64 = 79_228_162_514_264_337_593_543_950_336.0;

/// Number of fractional bits in a Q96 value
pub const Q96_RESOLUTION: usize = 96;

/// Price ratio between adjacent ticks
pub const TICK_BASE: f64 = 1.0001;

/// Largest integer an f64 represents exactly (2^53)
pub const F64_EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

// ============================================================================
// Tick Bounds
// ============================================================================

/// Minimum tick supported by Uniswap V3
pub const MIN_TICK: i32 = -887_272;

/// Maximum tick supported by Uniswap V3
pub const MAX_TICK: i32 = 887_272;

// ============================================================================
// Valuation Rounding
// ============================================================================

/// Display decimals used when the price feed has no exchange precision
pub const DEFAULT_DISPLAY_DECIMALS: u8 = 8;

/// Decimal places for token allocation percentages
pub const PCT_DECIMALS: u8 = 1;

/// Decimal places for USD values
pub const USD_DECIMALS: u8 = 2;

/// Decimal places for pool prices reported without USD pricing
pub const RATIO_PRICE_DECIMALS: u8 = 6;

/// Price assigned to every stablecoin leg
pub const STABLECOIN_PRICE_USD: f64 = 1.0;

// ============================================================================
// Time
// ============================================================================

/// Seconds per hour, for converting hour-denominated config to timestamps
pub const SECONDS_PER_HOUR: f64 = 3_600.0;

// ============================================================================
// Tokens
// ============================================================================

/// Symbols treated as stablecoins when no explicit list is configured
pub const DEFAULT_STABLECOINS: [&str; 8] = ["USDC", "USDC.E", "USDT", "DAI", "FRAX", "LUSD", "USDE", "PYUSD"];
