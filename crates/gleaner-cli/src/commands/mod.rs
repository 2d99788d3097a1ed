//! Subcommand implementations.

pub mod capture;
pub mod clear;
pub mod export;
pub mod mark_viewed;
pub mod status;
pub mod sweep;

use std::path::Path;

use anyhow::Result;

use gleaner_core::CaptureLimits;
use gleaner_store::{FileStore, Repository};

use crate::data_dir;

/// Open the repository over the resolved data directory.
pub(crate) fn open_repository(override_dir: Option<&Path>) -> Result<Repository<FileStore>> {
    let root = data_dir::store_root(override_dir)?;
    Ok(Repository::new(
        FileStore::new(root),
        CaptureLimits::default(),
    ))
}
