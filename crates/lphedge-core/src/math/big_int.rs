//! Big integer operations for high-precision math
//!
//! U256/U512 come from `ruint`. Q96 amount formulas multiply a 224-bit
//! shifted liquidity by a 160-bit price difference, so every product is
//! formed in U512 and narrowed back to U256 after division.

pub use ruint::aliases::{U256, U512};

use crate::errors::{CoreError, CoreResult};

/// Rounding mode for division operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round down (towards zero)
    Down,
    /// Round up (away from zero)
    Up,
}

/// 2^64 as a float, for limb recombination
const LIMB_SCALE: f64 = 18_446_744_073_709_551_616.0;

/// Multiply two U256 values and divide by a third with specified rounding
/// result = (a * b) / denominator
pub fn mul_div(a: U256, b: U256, denominator: U256, rounding: Rounding) -> CoreResult<U256> {
    mul_div_wide(U512::from(a), U512::from(b), U512::from(denominator), rounding)
}

/// Same as [`mul_div`] but with a denominator that may exceed 256 bits
pub fn mul_div_wide(a: U512, b: U512, denominator: U512, rounding: Rounding) -> CoreResult<U256> {
    if denominator.is_zero() {
        return Err(CoreError::DivisionByZero);
    }

    let product = a * b;
    let quotient = product / denominator;
    let remainder = product % denominator;

    let quotient = narrow(quotient)?;

    if rounding == Rounding::Up && !remainder.is_zero() {
        return quotient
            .checked_add(U256::from(1u8))
            .ok_or(CoreError::MathOverflow);
    }

    Ok(quotient)
}

/// Narrow a U512 to U256, failing if any of the upper 256 bits are set
pub fn narrow(value: U512) -> CoreResult<U256> {
    let bytes: [u8; 64] = value.to_le_bytes();
    if bytes.iter().skip(32).any(|byte| *byte != 0) {
        return Err(CoreError::MathOverflow);
    }

    let mut low = [0u8; 32];
    low.copy_from_slice(&bytes[0..32]);
    Ok(U256::from_le_bytes(low))
}

/// Convert U256 to the nearest f64
///
/// Values above 2^53 lose low-order bits. Callers only use the result for
/// display and decision thresholds.
pub fn u256_to_f64(value: U256) -> f64 {
    value
        .as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * LIMB_SCALE + *limb as f64)
}

/// Convert a non-negative finite f64 to U256, flooring the fractional part
pub fn f64_to_u256(value: f64) -> CoreResult<U256> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::ConversionError);
    }

    let floored = value.floor();
    if floored < 1.0 {
        return Ok(U256::ZERO);
    }

    // floored = mantissa * 2^exponent with an explicit leading bit
    let bits = floored.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32 - 1075;
    let mantissa = (bits & 0x000f_ffff_ffff_ffff) | 0x0010_0000_0000_0000;

    if exponent >= 0 {
        if exponent as usize + 53 > 256 {
            return Err(CoreError::MathOverflow);
        }
        Ok(U256::from(mantissa) << exponent as usize)
    } else {
        Ok(U256::from(mantissa >> (-exponent) as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_rounding() {
        let ten = U256::from(10u64);
        let three = U256::from(3u64);
        let four = U256::from(4u64);

        // 30 / 4 = 7.5
        assert_eq!(mul_div(ten, three, four, Rounding::Down).unwrap(), U256::from(7u64));
        assert_eq!(mul_div(ten, three, four, Rounding::Up).unwrap(), U256::from(8u64));

        // Exact division is not bumped
        let five = U256::from(5u64);
        assert_eq!(mul_div(ten, four, five, Rounding::Up).unwrap(), U256::from(8u64));
    }

    #[test]
    fn test_mul_div_large_intermediate() {
        // (2^200 * 2^200) / 2^150 = 2^250: the product needs 400 bits
        let a = U256::from(1u8) << 200;
        let denom = U256::from(1u8) << 150;
        let result = mul_div(a, a, denom, Rounding::Down).unwrap();
        assert_eq!(result, U256::from(1u8) << 250);
    }

    #[test]
    fn test_mul_div_errors() {
        let one = U256::from(1u8);
        assert_eq!(mul_div(one, one, U256::ZERO, Rounding::Down), Err(CoreError::DivisionByZero));

        // 2^255 * 4 / 1 does not fit back into 256 bits
        let big = U256::from(1u8) << 255;
        assert_eq!(
            mul_div(big, U256::from(4u8), one, Rounding::Down),
            Err(CoreError::MathOverflow)
        );
    }

    #[test]
    fn test_float_conversions() {
        assert_eq!(f64_to_u256(0.99).unwrap(), U256::ZERO);
        assert_eq!(f64_to_u256(12345.9).unwrap(), U256::from(12345u64));
        assert_eq!(f64_to_u256(2f64.powi(96)).unwrap(), U256::from(1u8) << 96);
        assert!(f64_to_u256(-1.0).is_err());
        assert!(f64_to_u256(f64::NAN).is_err());
        assert!(f64_to_u256(f64::INFINITY).is_err());

        assert_eq!(u256_to_f64(U256::from(42u64)), 42.0);
        assert_eq!(u256_to_f64(U256::from(1u8) << 160), 2f64.powi(160));
    }
}
