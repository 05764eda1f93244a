//! Hedge state carried between keeper processes.
//!
//! A cron-driven `--once` run is a fresh process each time, so the last
//! applied ratio, the rebalance timestamp and the price window live in a JSON
//! file next to the config.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use lphedge_core::HedgeState;
use serde::{Deserialize, Serialize};

use crate::error::{KeeperError, KeeperResult};

/// On-disk hedge state keyed by position id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedStates {
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub positions: BTreeMap<String, HedgeState>,
}

impl PersistedStates {
    pub fn new(positions: BTreeMap<String, HedgeState>) -> Self {
        Self {
            saved_at: Some(Utc::now()),
            positions,
        }
    }

    /// Load saved state; a missing file means no position has history yet
    pub fn load(path: &str) -> KeeperResult<Self> {
        if !Path::new(path).exists() {
            log::info!("No hedge state at {}, starting from unhedged positions", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| KeeperError::Io(format!("Failed to read state file {}: {}", path, e)))?;

        serde_json::from_str(&content)
            .map_err(|e| KeeperError::SerializationError(format!("Failed to parse state file {}: {}", path, e)))
    }

    /// Write to a `.tmp` sibling, then rename over `path`
    pub fn save(&self, path: &str) -> KeeperResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp = format!("{}.tmp", path);
        fs::write(&tmp, content).map_err(|e| KeeperError::Io(format!("Failed to write state file {}: {}", tmp, e)))?;
        fs::rename(&tmp, path).map_err(|e| KeeperError::Io(format!("Failed to replace state file {}: {}", path, e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("lphedge-state-{}-{}.json", name, std::process::id()))
            .to_string_lossy()
            .to_string()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let loaded = PersistedStates::load(&temp_path("missing")).unwrap();
        assert!(loaded.positions.is_empty());
        assert_eq!(loaded.saved_at, None);
    }

    #[test]
    fn test_save_and_load() {
        let mut state = HedgeState::new();
        state.last_rebalance_at = Some(1_700_000_000);
        state.current_hedge_ratio = 0.35;
        state.price_window.observe(1_700_000_000, 3_000.0, 86_400.0).unwrap();
        state.price_window.observe(1_700_000_060, 2_990.0, 86_400.0).unwrap();

        let saved = PersistedStates::new(BTreeMap::from([("eth".to_string(), state)]));
        let path = temp_path("roundtrip");
        saved.save(&path).unwrap();
        let loaded = PersistedStates::load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, saved);
        assert_eq!(loaded.positions["eth"].price_window.len(), 2);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        fs::write(&path, "{ not json").unwrap();
        let result = PersistedStates::load(&path);
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(KeeperError::SerializationError(_))));
    }
}
