//! # Core Error Types
//!
//! Errors raised by valuation, policy and scheduling code. Pure math failures
//! that have an economic meaning (empty position, empty range) return zero
//! results instead of errors; everything here is something a caller must see.

use thiserror::Error;

/// Core errors surfaced to the driving service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub enum CoreError {
    // ========================================================================
    // Upstream Errors
    // ========================================================================

    /// Chain/RPC failure while reading pool state
    #[error("Pool read failed: {0}")]
    PoolRead(String),

    /// No USD price for a non-stablecoin leg
    #[error("Valuation unavailable: no USD price for {symbol}")]
    ValuationUnavailable { symbol: String },

    // ========================================================================
    // Math Errors
    // ========================================================================

    #[error("Degenerate tick range: lower {tick_lower} >= upper {tick_upper}")]
    DegenerateRange { tick_lower: i32, tick_upper: i32 },

    #[error("Tick out of range: {0}")]
    TickOutOfRange(i32),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Math overflow")]
    MathOverflow,

    #[error("Conversion error")]
    ConversionError,

    // ========================================================================
    // State and Configuration Errors
    // ========================================================================

    /// Sample older than the newest entry in a time-ordered window
    #[error("Stale data")]
    StaleData,

    #[error("Invalid hedge config: {0}")]
    InvalidConfig(String),
}

/// Result type using core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a pool read error from any displayable cause
    pub fn pool_read(cause: impl std::fmt::Display) -> Self {
        Self::PoolRead(cause.to_string())
    }

    /// Create an invalid config error naming the offending field
    pub fn invalid_config(field: &str, value: impl std::fmt::Display, expected: &str) -> Self {
        Self::InvalidConfig(format!("{} = {} (expected {})", field, value, expected))
    }

    /// Whether this error only degrades functionality instead of failing the cycle
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::ValuationUnavailable { .. })
    }
}
