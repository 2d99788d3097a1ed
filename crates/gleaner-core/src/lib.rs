//! gleaner-core - Core types and traits for the gleaner capture toolkit.

pub mod error;
pub mod extract;
pub mod limits;
pub mod message;
pub mod record;
pub mod signal;
pub mod traits;
pub mod types;

pub use error::Error;
pub use extract::ExportRow;
pub use limits::CaptureLimits;
pub use message::{StoreRequest, StoreResponse};
pub use record::{
    AccountCollection, CandidateRecord, ConnectionRecord, RelationCounts, RepositoryState,
    ViewingState,
};
pub use signal::{PageContext, Signal};
pub use traits::StatePersistence;
pub use types::{AccountName, PageTarget, RelationKind, UserId};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
