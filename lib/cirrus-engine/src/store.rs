//! State file persistence
//!
//! The snapshot lives in a single JSON file next to the stack definition.
//! A missing file means a fresh lineage; the file is rewritten wholesale
//! after each apply. Locking against concurrent applies is out of scope.

use crate::error::Result;
use chrono::Utc;
use cirrus_core::StateSnapshot;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a snapshot, or start a fresh lineage if the file does not exist
pub fn load_state(path: &Path) -> Result<StateSnapshot> {
    if !path.exists() {
        debug!("No state file at {}, starting fresh", path.display());
        return Ok(StateSnapshot::empty());
    }
    let data = fs::read_to_string(path)?;
    let snapshot = serde_json::from_str(&data)?;
    debug!("Loaded state from {}", path.display());
    Ok(snapshot)
}

/// Write a snapshot, stamping the write time
pub fn save_state(path: &Path, snapshot: &StateSnapshot) -> Result<()> {
    let mut snapshot = snapshot.clone();
    snapshot.updated_at = Utc::now();
    let data = serde_json::to_string_pretty(&snapshot)?;
    fs::write(path, data + "\n")?;
    debug!(
        "Saved state to {} (serial {})",
        path.display(),
        snapshot.serial
    );
    Ok(())
}
