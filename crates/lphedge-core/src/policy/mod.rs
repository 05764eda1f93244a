//! # Hedge Policy
//!
//! Computes the target hedge ratio for a position and decides whether the
//! drift from the applied ratio is worth a rebalance. Dynamic profiles are
//! asymmetric by construction: they never reach a full 1:1 hedge.

pub mod hedge_policy;
pub mod profiles;

pub use hedge_policy::*;
pub use profiles::*;
