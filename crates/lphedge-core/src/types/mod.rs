//! # Core Types
//!
//! Pool inputs, priced snapshots, hedge configuration and hedge state.

pub mod hedge;
pub mod pool;
pub mod position;

pub use hedge::*;
pub use pool::*;
pub use position::*;
