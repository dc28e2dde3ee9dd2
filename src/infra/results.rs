// ============================================================
// Layer 6 — Result Files
// ============================================================
// JSON persistence for aggregated results: mesh grids,
// classwise accuracy tables and raw accuracy series. Grids are
// checked against the ranges they are read back for, so a file
// saved for one mesh can't silently be plotted against another.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::Path};

use crate::domain::grid::MeshGrid;
use crate::domain::mesh::MeshRanges;

/// Write any serialisable result as pretty JSON, creating parent directories.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    tracing::info!("Saved results to '{}'", path.display());
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Malformed results in '{}'", path.display()))
}

/// Load a grid and check it matches `ranges`.
pub fn load_grid(path: &Path, ranges: &MeshRanges) -> Result<MeshGrid> {
    let grid: MeshGrid = load_json(path)?;
    grid.check_shape(ranges)
        .with_context(|| format!("Grid in '{}' does not fit the mesh", path.display()))?;
    Ok(grid)
}
