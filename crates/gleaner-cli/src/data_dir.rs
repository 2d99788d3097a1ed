//! Data directory resolution.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Resolve the store root: an explicit override wins, otherwise the
/// platform data directory.
pub fn store_root(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        return Ok(dir.to_path_buf());
    }

    let dirs =
        ProjectDirs::from("", "", "gleaner").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.to_path_buf())
}
