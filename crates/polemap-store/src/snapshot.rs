//! JSON snapshots of the in-memory inventory, used by the CLI.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use polemap_core::PoleRecord;

use crate::MemoryInventory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    poles: Vec<PoleRecord>,
}

/// Load an inventory from a JSON snapshot file. A missing file yields an
/// empty inventory, so the CLI can bootstrap its own state.
pub fn load(path: &Path) -> Result<MemoryInventory, StoreError> {
    if !path.exists() {
        info!(path = %path.display(), "no snapshot, starting empty");
        return Ok(MemoryInventory::new());
    }
    let data = fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&data)?;
    info!(path = %path.display(), poles = snapshot.poles.len(), "loaded snapshot");
    Ok(MemoryInventory::from_records(snapshot.poles))
}

/// Write the inventory back out as pretty-printed JSON.
pub fn save(path: &Path, inventory: &MemoryInventory) -> Result<(), StoreError> {
    let snapshot = Snapshot {
        poles: inventory.records(),
    };
    let data = serde_json::to_string_pretty(&snapshot)?;
    fs::write(path, data)?;
    info!(path = %path.display(), poles = snapshot.poles.len(), "saved snapshot");
    Ok(())
}
