//! Snapshot export (JSON).

use anyhow::{Context, Result};
use marketpanel_core::Snapshot;
use std::path::Path;

/// Pretty-printed, with non-ASCII field names written as-is.
pub fn write_snapshot_json(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let json = snapshot
        .to_json_pretty()
        .context("Failed to serialize snapshot")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    Ok(())
}
