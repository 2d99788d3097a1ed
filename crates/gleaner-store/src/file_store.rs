//! Filesystem persistence for the state document.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use tracing::{debug, warn};

use gleaner_core::Result;
use gleaner_core::error::{Error, PersistenceError};
use gleaner_core::record::RepositoryState;
use gleaner_core::traits::StatePersistence;

fn map_io(err: std::io::Error, what: &str) -> Error {
    Error::Persistence(PersistenceError::Write {
        message: format!("{}: {}", what, err),
    })
}

/// The state document as a single JSON file on disk.
///
/// Writes go through a temp file and an atomic rename, under an exclusive
/// lock, so a crash mid-write leaves the previous document intact and two
/// processes cannot interleave a read-modify-write.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a file store rooted at the given directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the state document.
    pub fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join("state.lock")
    }

    fn acquire_lock(&self) -> Result<std::fs::File> {
        fs::create_dir_all(&self.root).map_err(|e| map_io(e, "create store directory"))?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| map_io(e, "open lock file"))?;

        lock_file
            .lock_exclusive()
            .map_err(|e| map_io(e, "lock state file"))?;

        Ok(lock_file)
    }
}

#[async_trait]
impl StatePersistence for FileStore {
    async fn load(&self) -> Result<RepositoryState> {
        let path = self.state_path();

        if !path.exists() {
            return Ok(RepositoryState::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            Error::Persistence(PersistenceError::Read {
                message: format!("read {}: {}", path.display(), e),
            })
        })?;

        match serde_json::from_str(&content) {
            Ok(state) => Ok(state),
            Err(e) => {
                // A corrupt document is not worth dying over; start empty
                // and let the next save replace it.
                warn!(path = %path.display(), error = %e, "State document corrupt, loading empty state");
                Ok(RepositoryState::default())
            }
        }
    }

    async fn save(&self, state: &RepositoryState) -> Result<()> {
        let lock_file = self.acquire_lock()?;

        let content = serde_json::to_string_pretty(state).map_err(|e| {
            Error::Persistence(PersistenceError::Codec {
                message: e.to_string(),
            })
        })?;

        let path = self.state_path();
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content).map_err(|e| map_io(e, "write state temp file"))?;
        fs::rename(&temp_path, &path).map_err(|e| map_io(e, "replace state file"))?;

        lock_file
            .unlock()
            .map_err(|e| map_io(e, "unlock state file"))?;

        debug!(path = %path.display(), bytes = content.len(), "Saved state document");

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let lock_file = self.acquire_lock()?;

        let path = self.state_path();
        if path.exists() {
            fs::remove_file(&path).map_err(|e| map_io(e, "remove state file"))?;
        }

        lock_file
            .unlock()
            .map_err(|e| map_io(e, "unlock state file"))?;

        debug!(path = %path.display(), "Cleared state document");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gleaner_core::record::{CandidateRecord, ConnectionRecord};
    use gleaner_core::types::{AccountName, UserId};
    use serde_json::json;

    fn sample_state() -> RepositoryState {
        let mut state = RepositoryState::default();
        let account = AccountName::new("alice").unwrap();
        let candidate = CandidateRecord {
            id: UserId::new("1").unwrap(),
            raw_payload: json!({"rest_id": "1"}),
            sort_index: None,
            entry_id: None,
        };
        let record =
            ConnectionRecord::from_candidate(candidate, Utc.timestamp_opt(100, 0).unwrap());
        state
            .accounts
            .entry(account)
            .or_default()
            .following
            .insert(record.id.clone(), record);
        state
    }

    #[tokio::test]
    async fn missing_document_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let state = store.load().await.unwrap();
        assert_eq!(state.total_records(), 0);
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save(&sample_state()).await.unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.total_records(), 1);
        let account = AccountName::new("alice").unwrap();
        assert!(state.accounts[&account].following.contains_key(&UserId::new("1").unwrap()));
    }

    #[tokio::test]
    async fn corrupt_document_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(store.state_path(), "{not json").unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.total_records(), 0);
    }

    #[tokio::test]
    async fn clear_removes_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save(&sample_state()).await.unwrap();
        assert!(store.state_path().exists());

        store.clear().await.unwrap();
        assert!(!store.state_path().exists());

        let state = store.load().await.unwrap();
        assert_eq!(state.total_records(), 0);
    }

    #[tokio::test]
    async fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save(&sample_state()).await.unwrap();
        assert!(!store.state_path().with_extension("json.tmp").exists());
    }
}
