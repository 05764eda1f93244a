//! # Liquidity Math
//!
//! Token amounts held by a concentrated liquidity position, in raw on-chain
//! units and in human-readable units.

use crate::constants::{F64_EXACT_INTEGER_LIMIT, Q96_RESOLUTION};
use crate::errors::{CoreError, CoreResult};
use crate::math::big_int::{mul_div_wide, narrow, u256_to_f64, Rounding, U256, U512};
use crate::math::tick_math::tick_to_sqrt_price_x96;

/// Raw token amounts for a position (smallest token units)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawAmounts {
    pub amount0: U256,
    pub amount1: U256,
}

/// Amount of token0 spanned by liquidity between two sqrt prices
///
/// floor((L << 96) * (B - A) / (B * A)) with A <= B. Equal prices yield zero;
/// a zero sqrt price is rejected.
pub fn amount0_from_liquidity(
    liquidity: u128,
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
) -> CoreResult<U256> {
    let (lower, upper) = ordered(sqrt_price_a_x96, sqrt_price_b_x96);
    if lower.is_zero() {
        return Err(CoreError::DivisionByZero);
    }
    if liquidity == 0 || lower == upper {
        return Ok(U256::ZERO);
    }

    let numerator1 = U512::from(liquidity) << Q96_RESOLUTION;
    let numerator2 = U512::from(upper - lower);
    let denominator = U512::from(upper) * U512::from(lower);

    mul_div_wide(numerator1, numerator2, denominator, Rounding::Down)
}

/// Amount of token1 spanned by liquidity between two sqrt prices
///
/// (L * (B - A)) >> 96 with A <= B.
pub fn amount1_from_liquidity(
    liquidity: u128,
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
) -> CoreResult<U256> {
    let (lower, upper) = ordered(sqrt_price_a_x96, sqrt_price_b_x96);
    if liquidity == 0 || lower == upper {
        return Ok(U256::ZERO);
    }

    let product = U512::from(liquidity) * U512::from(upper - lower);
    narrow(product >> Q96_RESOLUTION)
}

/// Raw amounts for a position given the pool's current tick and sqrt price
///
/// Price below the range holds only token0, above the range only token1.
/// `current_tick == tick_lower` and `current_tick == tick_upper` are in range.
pub fn compute_amounts_for_range(
    liquidity: u128,
    current_tick: i32,
    tick_lower: i32,
    tick_upper: i32,
    sqrt_price_current_x96: U256,
) -> CoreResult<RawAmounts> {
    if tick_lower >= tick_upper {
        return Err(CoreError::DegenerateRange { tick_lower, tick_upper });
    }
    if liquidity == 0 {
        return Ok(RawAmounts::default());
    }

    let sqrt_lower = tick_to_sqrt_price_x96(tick_lower)?;
    let sqrt_upper = tick_to_sqrt_price_x96(tick_upper)?;

    let amounts = if current_tick < tick_lower {
        RawAmounts {
            amount0: amount0_from_liquidity(liquidity, sqrt_lower, sqrt_upper)?,
            amount1: U256::ZERO,
        }
    } else if current_tick > tick_upper {
        RawAmounts {
            amount0: U256::ZERO,
            amount1: amount1_from_liquidity(liquidity, sqrt_lower, sqrt_upper)?,
        }
    } else {
        // The pool's sqrt price can sit a hair outside the tick-derived bounds
        let sqrt_current = sqrt_price_current_x96.clamp(sqrt_lower, sqrt_upper);
        RawAmounts {
            amount0: amount0_from_liquidity(liquidity, sqrt_current, sqrt_upper)?,
            amount1: amount1_from_liquidity(liquidity, sqrt_lower, sqrt_current)?,
        }
    };

    Ok(amounts)
}

/// Convert a raw amount to human-readable units: amount / 10^decimals
pub fn to_human_amount(raw: U256, decimals: u8) -> f64 {
    let value = u256_to_f64(raw);
    if value > F64_EXACT_INTEGER_LIMIT {
        log::debug!(
            "raw amount {} exceeds f64 integer precision; human value is approximate",
            raw
        );
    }
    value / 10f64.powi(decimals as i32)
}

/// Human-readable (token0, token1) amounts for a position
///
/// Zero liquidity yields (0.0, 0.0) regardless of ticks.
pub fn human_amounts_for_range(
    liquidity: u128,
    current_tick: i32,
    tick_lower: i32,
    tick_upper: i32,
    sqrt_price_current_x96: U256,
    token0_decimals: u8,
    token1_decimals: u8,
) -> CoreResult<(f64, f64)> {
    if liquidity == 0 {
        return Ok((0.0, 0.0));
    }

    let raw = compute_amounts_for_range(
        liquidity,
        current_tick,
        tick_lower,
        tick_upper,
        sqrt_price_current_x96,
    )?;

    Ok((
        to_human_amount(raw.amount0, token0_decimals),
        to_human_amount(raw.amount1, token1_decimals),
    ))
}

fn ordered(a: U256, b: U256) -> (U256, U256) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Q96;
    use approx::assert_relative_eq;

    #[test]
    fn test_amount_deltas() {
        let sqrt_lower = U256::from(Q96); // price 1.0
        let sqrt_upper = U256::from(Q96 + Q96 / 100); // sqrt price 1.01
        let liquidity = 1_000_000_000_000u128;

        // L * (1/1.0 - 1/1.01)
        let amount0 = amount0_from_liquidity(liquidity, sqrt_lower, sqrt_upper).unwrap();
        assert_relative_eq!(u256_to_f64(amount0), 1e12 * (1.0 - 1.0 / 1.01), max_relative = 1e-9);

        // L * (1.01 - 1.0)
        let amount1 = amount1_from_liquidity(liquidity, sqrt_lower, sqrt_upper).unwrap();
        assert_relative_eq!(u256_to_f64(amount1), 1e10, max_relative = 1e-9);
    }

    #[test]
    fn test_argument_order_is_irrelevant() {
        let a = tick_to_sqrt_price_x96(-500).unwrap();
        let b = tick_to_sqrt_price_x96(700).unwrap();
        let liquidity = 10u128.pow(20);

        assert_eq!(
            amount0_from_liquidity(liquidity, a, b).unwrap(),
            amount0_from_liquidity(liquidity, b, a).unwrap()
        );
        assert_eq!(
            amount1_from_liquidity(liquidity, a, b).unwrap(),
            amount1_from_liquidity(liquidity, b, a).unwrap()
        );
    }

    #[test]
    fn test_equal_and_zero_prices() {
        let p = U256::from(Q96);
        assert_eq!(amount0_from_liquidity(1_000, p, p).unwrap(), U256::ZERO);
        assert_eq!(amount1_from_liquidity(1_000, p, p).unwrap(), U256::ZERO);
        assert_eq!(amount0_from_liquidity(1_000, U256::ZERO, p), Err(CoreError::DivisionByZero));
    }

    #[test]
    fn test_max_liquidity_does_not_overflow() {
        let lower = tick_to_sqrt_price_x96(-887_000).unwrap();
        let upper = tick_to_sqrt_price_x96(887_000).unwrap();

        assert!(amount1_from_liquidity(u128::MAX, lower, upper).is_ok());
        assert!(amount0_from_liquidity(u128::MAX, lower, upper).is_ok());
    }

    #[test]
    fn test_three_way_branch() {
        let liquidity = 1_000_000u128;
        let sqrt_at = |tick| tick_to_sqrt_price_x96(tick).unwrap();

        let below = compute_amounts_for_range(liquidity, -150, -100, 100, sqrt_at(-150)).unwrap();
        assert!(below.amount0 > U256::ZERO);
        assert_eq!(below.amount1, U256::ZERO);

        let above = compute_amounts_for_range(liquidity, 150, -100, 100, sqrt_at(150)).unwrap();
        assert_eq!(above.amount0, U256::ZERO);
        assert_eq!(
            above.amount1,
            amount1_from_liquidity(liquidity, sqrt_at(-100), sqrt_at(100)).unwrap()
        );

        let inside = compute_amounts_for_range(liquidity, 0, -100, 100, sqrt_at(0)).unwrap();
        assert!(inside.amount0 > U256::ZERO);
        assert!(inside.amount1 > U256::ZERO);
    }

    #[test]
    fn test_boundaries_are_in_range() {
        let liquidity = 10u128.pow(18);
        let sqrt_at = |tick| tick_to_sqrt_price_x96(tick).unwrap();

        // At the lower bound everything is still token0, computed by the in-range branch
        let at_lower = compute_amounts_for_range(liquidity, -100, -100, 100, sqrt_at(-100)).unwrap();
        assert_eq!(
            at_lower.amount0,
            amount0_from_liquidity(liquidity, sqrt_at(-100), sqrt_at(100)).unwrap()
        );
        assert_eq!(at_lower.amount1, U256::ZERO);

        let at_upper = compute_amounts_for_range(liquidity, 100, -100, 100, sqrt_at(100)).unwrap();
        assert_eq!(at_upper.amount0, U256::ZERO);
        assert_eq!(
            at_upper.amount1,
            amount1_from_liquidity(liquidity, sqrt_at(-100), sqrt_at(100)).unwrap()
        );
    }

    #[test]
    fn test_degenerate_range_rejected() {
        let p = U256::from(Q96);
        assert_eq!(
            compute_amounts_for_range(1_000, 0, 10, 10, p),
            Err(CoreError::DegenerateRange { tick_lower: 10, tick_upper: 10 })
        );
        assert!(compute_amounts_for_range(1_000, 0, 20, -20, p).is_err());
    }

    #[test]
    fn test_human_amounts() {
        assert_eq!(to_human_amount(U256::from(1_500_000u64), 6), 1.5);

        let zero = human_amounts_for_range(0, 5, -100, 100, U256::from(Q96), 18, 6).unwrap();
        assert_eq!(zero, (0.0, 0.0));

        let sqrt = tick_to_sqrt_price_x96(0).unwrap();
        let (a0, a1) = human_amounts_for_range(10u128.pow(18), 0, -100, 100, sqrt, 18, 18).unwrap();
        // Symmetric range around price 1.0 holds equal amounts of each side
        assert_relative_eq!(a0, a1, max_relative = 1e-6);
    }
}
