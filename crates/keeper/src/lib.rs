pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod state_store;

pub use collaborators::{
    ConfigStore, DryRunExecutor, ExecutionReport, HedgeExecutor, InMemoryConfigStore, SnapshotMarket,
};
pub use config::{create_example_config, KeeperConfig, PositionConfig};
pub use engine::{CycleOutcome, CycleSummary, HedgeEngine, SkipReason};
pub use error::{KeeperError, KeeperResult};
pub use state_store::PersistedStates;
