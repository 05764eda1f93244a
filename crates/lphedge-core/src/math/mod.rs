//! # Mathematical Functions
//!
//! Pure concentrated liquidity math: tick/price conversions, liquidity to
//! token amounts, and display rounding.

pub mod big_int;
pub mod liquidity_math;
pub mod rounding;
pub mod tick_math;

// Re-export commonly used functions
pub use big_int::*;
pub use liquidity_math::*;
pub use rounding::*;
pub use tick_math::*;
