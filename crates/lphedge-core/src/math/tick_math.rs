//! # Tick Math
//!
//! Conversions between ticks, prices and Q96 sqrt prices.
//!
//! These use `f64` for `1.0001^tick`, which is adequate for valuation and hedge
//! decisions but is NOT bit-exact with the on-chain Q96 tick math: results
//! drift at the micro-unit level and lose integer precision above 2^53.

use crate::constants::{MAX_TICK, MIN_TICK, Q96_F64, TICK_BASE};
use crate::errors::{CoreError, CoreResult};
use crate::math::big_int::{f64_to_u256, u256_to_f64, U256};

/// Raw price (token1 units per token0 unit) at a tick: 1.0001^tick
pub fn tick_to_price(tick: i32) -> f64 {
    TICK_BASE.powf(tick as f64)
}

/// Sqrt price at a tick in Q96 format: floor(1.0001^(tick/2) * 2^96)
pub fn tick_to_sqrt_price_x96(tick: i32) -> CoreResult<U256> {
    if !is_tick_valid(tick) {
        return Err(CoreError::TickOutOfRange(tick));
    }

    let sqrt_price = TICK_BASE.powf(tick as f64 / 2.0) * Q96_F64;
    f64_to_u256(sqrt_price)
}

/// Raw price encoded by a Q96 sqrt price: (sqrtPriceX96 / 2^96)^2
pub fn sqrt_price_x96_to_price(sqrt_price_x96: U256) -> f64 {
    let ratio = u256_to_f64(sqrt_price_x96) / Q96_F64;
    ratio * ratio
}

/// Nearest tick at or below a raw price
pub fn price_to_tick(price: f64) -> CoreResult<i32> {
    if !price.is_finite() || price <= 0.0 {
        return Err(CoreError::ConversionError);
    }

    let tick = (price.ln() / TICK_BASE.ln()).floor();
    if tick < MIN_TICK as f64 || tick > MAX_TICK as f64 {
        return Err(CoreError::TickOutOfRange(tick as i32));
    }
    Ok(tick as i32)
}

/// Check if a tick is within the supported range
pub fn is_tick_valid(tick: i32) -> bool {
    (MIN_TICK..=MAX_TICK).contains(&tick)
}
