//! Store persistence.
//!
//! Saves and loads the settlement store to/from a JSON file. The store
//! is small (one league's picks and ledger rows), so a whole-image
//! snapshot after each grading run is sufficient.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use super::{SettlementStore, StoreSnapshot};

/// Default snapshot file path.
const DEFAULT_SNAPSHOT_FILE: &str = "verdict_store.json";

/// Save the store to a JSON snapshot file.
pub fn save_store(store: &SettlementStore, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    let snapshot = store.to_snapshot();
    let json = serde_json::to_string_pretty(&snapshot)
        .context("Failed to serialise store snapshot")?;

    std::fs::write(path, &json).context(format!("Failed to write snapshot to {path}"))?;

    debug!(
        path,
        picks = snapshot.picks.len(),
        decisions = snapshot.decisions.len(),
        "Store snapshot saved"
    );
    Ok(())
}

/// Load the store from a JSON snapshot file.
/// Returns None if the file doesn't exist (fresh start).
pub fn load_store(path: Option<&str>) -> Result<Option<SettlementStore>> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);

    if !Path::new(path).exists() {
        info!(path, "No store snapshot found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read snapshot from {path}"))?;

    let snapshot: StoreSnapshot = serde_json::from_str(&json)
        .context(format!("Failed to parse snapshot from {path}"))?;

    info!(
        path,
        picks = snapshot.picks.len(),
        decisions = snapshot.decisions.len(),
        "Store restored from disk"
    );

    Ok(Some(SettlementStore::from_snapshot(snapshot)))
}

/// Delete the snapshot file (for testing or reset).
pub fn delete_store(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path).context(format!("Failed to delete snapshot file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Pick, PickType};

    fn temp_path() -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("verdict_test_store_{}.json", uuid::Uuid::new_v4()));
        p.to_string_lossy().to_string()
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path();
        let store = SettlementStore::new();
        let pick = Pick::sample(PickType::FirstTd, "Josh Allen", 900);
        let pick_id = pick.id;
        store.insert_pick(pick).unwrap();

        save_store(&store, Some(&path)).unwrap();

        let loaded = load_store(Some(&path)).unwrap();
        assert!(loaded.is_some());
        let loaded = loaded.unwrap();
        assert_eq!(loaded.pick_count(), 1);
        assert_eq!(loaded.pick(pick_id).unwrap().odds, 900);

        delete_store(Some(&path)).unwrap();
    }

    #[test]
    fn test_load_nonexistent() {
        let loaded = load_store(Some("/tmp/verdict_nonexistent_store_12345.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_delete_store() {
        let path = temp_path();
        save_store(&SettlementStore::new(), Some(&path)).unwrap();
        assert!(Path::new(&path).exists());

        delete_store(Some(&path)).unwrap();
        assert!(!Path::new(&path).exists());
    }

    #[test]
    fn test_delete_nonexistent_ok() {
        assert!(delete_store(Some("/tmp/verdict_does_not_exist_xyz.json")).is_ok());
    }
}
