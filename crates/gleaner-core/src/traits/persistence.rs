//! State persistence trait.

use async_trait::async_trait;

use crate::Result;
use crate::record::RepositoryState;

/// A durable home for the single state document.
///
/// The store mutates state read-modify-write through this seam, one
/// serialized operation at a time; implementations only need to make each
/// individual load/save durable and atomic.
#[async_trait]
pub trait StatePersistence: Send + Sync {
    /// Load the state document.
    ///
    /// A missing document loads as the default empty state; reads never
    /// surface a decode failure as an empty-handed caller.
    async fn load(&self) -> Result<RepositoryState>;

    /// Replace the state document.
    async fn save(&self, state: &RepositoryState) -> Result<()>;

    /// Delete the state document.
    async fn clear(&self) -> Result<()>;
}
