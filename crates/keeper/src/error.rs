//! Error types for the keeper service

use lphedge_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeeperError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Unknown position: {0}")]
    UnknownPosition(String),

    #[error("Execution failed for {position_id}: {reason}")]
    Execution { position_id: String, reason: String },

    #[error("Execution for {position_id} timed out after {timeout_ms}ms")]
    Timeout { position_id: String, timeout_ms: u64 },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type KeeperResult<T> = Result<T, KeeperError>;

impl KeeperError {
    /// Create an invalid config error naming the offending field
    pub fn invalid_config(field: &str, value: impl std::fmt::Display, expected: &str) -> Self {
        KeeperError::InvalidConfig(format!("{} = {} (expected {})", field, value, expected))
    }

    pub fn execution(position_id: &str, reason: impl std::fmt::Display) -> Self {
        KeeperError::Execution {
            position_id: position_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for KeeperError {
    fn from(err: std::io::Error) -> Self {
        KeeperError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for KeeperError {
    fn from(err: serde_json::Error) -> Self {
        KeeperError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for KeeperError {
    fn from(err: toml::de::Error) -> Self {
        KeeperError::SerializationError(err.to_string())
    }
}

impl From<toml::ser::Error> for KeeperError {
    fn from(err: toml::ser::Error) -> Self {
        KeeperError::SerializationError(err.to_string())
    }
}
