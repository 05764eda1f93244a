//! # Position Valuation
//!
//! Turns raw on-chain position and pool state into a [`PositionSnapshot`]:
//!
//! 1. **Amounts**: liquidity to token0/token1 via the range branch in
//!    [`compute_amounts_for_range`](crate::math::compute_amounts_for_range)
//! 2. **Prices**: tick-derived pool price and bounds, decimal adjusted
//! 3. **USD**: both legs priced or neither; stablecoins pinned at 1.0
//! 4. **Delta**: token0-equivalent exposure for the hedge policy
//!
//! When USD pricing succeeds, amounts are rounded to each token's display
//! precision before anything is derived from them so that displayed amounts
//! and displayed values agree.

use crate::constants::{PCT_DECIMALS, RATIO_PRICE_DECIMALS, STABLECOIN_PRICE_USD, USD_DECIMALS};
use crate::errors::CoreResult;
use crate::math::{human_amounts_for_range, percentage_of, round_to, sqrt_price_x96_to_price, tick_to_price};
use crate::pricing::{PoolStateReader, PriceFeed};
use crate::types::{PoolState, PositionSnapshot, RawPosition, ValuationStatus};

/// Values positions against an injected price feed
pub struct PositionValuer<'a> {
    feed: &'a dyn PriceFeed,
}

impl<'a> PositionValuer<'a> {
    pub fn new(feed: &'a dyn PriceFeed) -> Self {
        Self { feed }
    }

    /// Read the pool through `reader` and value the position against it
    ///
    /// Pool read failures propagate unchanged.
    pub fn value_from_reader(
        &self,
        reader: &dyn PoolStateReader,
        network: &str,
        pool_address: &str,
        position: &RawPosition,
    ) -> CoreResult<PositionSnapshot> {
        let pool = reader.read_pool(network, pool_address)?;
        self.value(position, &pool)
    }

    /// Value a position against an already-read pool state
    pub fn value(&self, position: &RawPosition, pool: &PoolState) -> CoreResult<PositionSnapshot> {
        pool.validate()?;
        position.validate()?;

        let current_tick = pool.current_tick;
        let in_range = position.is_in_range(current_tick);

        let (raw_amount0, raw_amount1) = human_amounts_for_range(
            position.liquidity,
            current_tick,
            position.tick_lower,
            position.tick_upper,
            pool.sqrt_price_x96,
            position.token0_decimals,
            position.token1_decimals,
        )?;

        let adjustment = decimal_adjustment(position.token0_decimals, position.token1_decimals);
        let price = sqrt_price_x96_to_price(pool.sqrt_price_x96) / adjustment;
        let price_lower = tick_to_price(position.tick_lower) / adjustment;
        let price_upper = tick_to_price(position.tick_upper) / adjustment;

        let mut snapshot = PositionSnapshot {
            tick_lower: position.tick_lower,
            tick_upper: position.tick_upper,
            liquidity: position.liquidity,
            token0_decimals: position.token0_decimals,
            token1_decimals: position.token1_decimals,
            token0_amount: raw_amount0,
            token1_amount: raw_amount1,
            price,
            price_lower,
            price_upper,
            price_usd0: None,
            price_usd1: None,
            position_value_usd: None,
            token0_pct: None,
            token1_pct: None,
            delta: 0.0,
            in_range,
            valuation: ValuationStatus::Priced,
        };

        match self.price_pair(&position.token0_symbol, &position.token1_symbol) {
            Ok((usd0, usd1)) => {
                let amount0 = round_to(raw_amount0, self.feed.display_decimals(&position.token0_symbol));
                let amount1 = round_to(raw_amount1, self.feed.display_decimals(&position.token1_symbol));

                let value0 = amount0 * usd0;
                let value1 = amount1 * usd1;
                let total = value0 + value1;

                snapshot.token0_amount = amount0;
                snapshot.token1_amount = amount1;
                snapshot.price_usd0 = Some(usd0);
                snapshot.price_usd1 = Some(usd1);
                snapshot.position_value_usd = Some(round_to(total, USD_DECIMALS));
                snapshot.token0_pct = Some(round_to(percentage_of(value0, total), PCT_DECIMALS));
                snapshot.token1_pct = Some(round_to(percentage_of(value1, total), PCT_DECIMALS));
            }
            Err(missing_symbol) => {
                log::warn!(
                    "No USD price for {}; valuing {}/{} position in ratio-only mode",
                    missing_symbol,
                    position.token0_symbol,
                    position.token1_symbol
                );
                snapshot.price = round_to(price, RATIO_PRICE_DECIMALS);
                snapshot.price_lower = round_to(price_lower, RATIO_PRICE_DECIMALS);
                snapshot.price_upper = round_to(price_upper, RATIO_PRICE_DECIMALS);
                snapshot.valuation = ValuationStatus::RatioOnly { missing_symbol };
            }
        }

        snapshot.delta = delta_for(snapshot.token0_amount, current_tick, position);
        Ok(snapshot)
    }

    /// USD price for one symbol; stablecoins never reach the feed
    pub fn usd_price(&self, symbol: &str) -> Option<f64> {
        if self.feed.is_stablecoin(symbol) {
            return Some(STABLECOIN_PRICE_USD);
        }
        self.feed
            .lookup_usd_price(symbol)
            .filter(|price| price.is_finite() && *price > 0.0)
    }

    /// Both USD prices, or the first symbol that has none
    fn price_pair(&self, token0: &str, token1: &str) -> Result<(f64, f64), String> {
        let usd0 = self.usd_price(token0).ok_or_else(|| token0.to_string())?;
        let usd1 = self.usd_price(token1).ok_or_else(|| token1.to_string())?;
        Ok((usd0, usd1))
    }
}

/// 10^(token1_decimals - token0_decimals)
fn decimal_adjustment(token0_decimals: u8, token1_decimals: u8) -> f64 {
    10f64.powi(token1_decimals as i32 - token0_decimals as i32)
}

fn delta_for(token0_amount: f64, current_tick: i32, position: &RawPosition) -> f64 {
    if current_tick > position.tick_upper {
        // Fully converted to token1
        0.0
    } else {
        token0_amount
    }
}
