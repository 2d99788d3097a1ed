//! In-memory persistence backend.

use std::sync::Mutex;

use async_trait::async_trait;

use gleaner_core::Result;
use gleaner_core::record::RepositoryState;
use gleaner_core::traits::StatePersistence;

/// A state document held in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<RepositoryState>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatePersistence for MemoryStore {
    async fn load(&self) -> Result<RepositoryState> {
        let guard = self.state.lock().expect("memory store poisoned");
        Ok(guard.clone().unwrap_or_default())
    }

    async fn save(&self, state: &RepositoryState) -> Result<()> {
        let mut guard = self.state.lock().expect("memory store poisoned");
        *guard = Some(state.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut guard = self.state.lock().expect("memory store poisoned");
        *guard = None;
        Ok(())
    }
}
