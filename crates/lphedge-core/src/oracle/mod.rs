//! # Oracle Module
//!
//! Price history used by the dynamic hedge policy: momentum, drawdown and
//! realized volatility over a sliding lookback window.

pub mod price_window;

pub use price_window::*;
