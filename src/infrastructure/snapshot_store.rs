use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::domain::snapshot::Snapshot;

/// Write a snapshot as pretty-printed JSON, creating parent directories.
pub fn save(snapshot: &Snapshot, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    Ok(())
}

/// Read a snapshot written by [`save`] (or by any producer of the same JSON
/// shape) and check that every column's `Field` matches its key.
pub fn load(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
    snapshot
        .validate()
        .with_context(|| format!("Invalid snapshot {}", path.display()))?;
    Ok(snapshot)
}
