//! Pool and raw position inputs read from chain.

use crate::errors::{CoreError, CoreResult};
use crate::math::big_int::U256;

/// Pool state read from chain at valuation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    /// Current sqrt price in Q96 format (fits in 160 bits)
    pub sqrt_price_x96: U256,
    /// Current pool tick
    pub current_tick: i32,
}

impl PoolState {
    pub fn new(sqrt_price_x96: U256, current_tick: i32) -> Self {
        Self { sqrt_price_x96, current_tick }
    }

    /// A zero sqrt price means the read returned an uninitialized pool
    pub fn validate(&self) -> CoreResult<()> {
        if self.sqrt_price_x96.is_zero() {
            return Err(CoreError::pool_read("pool returned zero sqrtPriceX96"));
        }
        if self.sqrt_price_x96.bit_len() > 160 {
            return Err(CoreError::pool_read("sqrtPriceX96 exceeds 160 bits"));
        }
        Ok(())
    }
}

/// On-chain position data plus token metadata, as handed to the valuer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
pub struct RawPosition {
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Raw on-chain liquidity
    pub liquidity: u128,
    pub token0_decimals: u8,
    pub token1_decimals: u8,
    pub token0_symbol: String,
    pub token1_symbol: String,
}

impl RawPosition {
    /// Reject ranges the math cannot value
    pub fn validate(&self) -> CoreResult<()> {
        if self.tick_lower >= self.tick_upper {
            return Err(CoreError::DegenerateRange {
                tick_lower: self.tick_lower,
                tick_upper: self.tick_upper,
            });
        }
        Ok(())
    }

    /// Inclusive on both bounds
    pub fn is_in_range(&self, current_tick: i32) -> bool {
        current_tick >= self.tick_lower && current_tick <= self.tick_upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(tick_lower: i32, tick_upper: i32) -> RawPosition {
        RawPosition {
            tick_lower,
            tick_upper,
            liquidity: 1,
            token0_decimals: 18,
            token1_decimals: 6,
            token0_symbol: "WETH".into(),
            token1_symbol: "USDC".into(),
        }
    }

    #[test]
    fn test_pool_state_validation() {
        assert!(PoolState::new(U256::from(1u8) << 96, 0).validate().is_ok());
        assert!(matches!(
            PoolState::new(U256::ZERO, 0).validate(),
            Err(CoreError::PoolRead(_))
        ));
        assert!(PoolState::new(U256::from(1u8) << 170, 0).validate().is_err());
    }

    #[test]
    fn test_range_checks() {
        let p = position(-60, 60);
        assert!(p.validate().is_ok());
        assert!(p.is_in_range(-60));
        assert!(p.is_in_range(60));
        assert!(!p.is_in_range(61));
        assert!(!p.is_in_range(-61));

        assert!(position(60, 60).validate().is_err());
    }
}
