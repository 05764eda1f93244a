//! # LP Hedge Core
//!
//! Pure valuation and hedging logic for Uniswap-V3-style concentrated
//! liquidity positions. It provides:
//!
//! - Tick, sqrt price and liquidity-to-amount conversions
//! - Priced position snapshots (amounts, USD value, allocation, delta)
//! - The static / dynamic hedge-ratio policy and its trigger decision
//! - The cooldown gate and price-history window around that policy
//!
//! Nothing in this crate performs I/O or reads the clock. Pool reads and price
//! lookups arrive through the capability traits in [`pricing`], and every
//! time-dependent call takes `now` as unix seconds.
//!
//! ## Feature Flags
//!
//! - `client`: Enables serde serialization for config, state and snapshots

pub mod constants;
pub mod errors;
pub mod math;
pub mod oracle;
pub mod policy;
pub mod pricing;
pub mod scheduler;
pub mod types;
pub mod valuation;

// Re-export commonly used items
pub use constants::*;
pub use errors::{CoreError, CoreResult};
pub use policy::{HedgeRatioPolicy, ProfileCoefficients, ProfileTable};
pub use pricing::{PoolStateReader, PriceFeed, TokenSymbolMap};
pub use scheduler::{RebalanceScheduler, ScheduledAction};
pub use types::*;
pub use valuation::PositionValuer;
