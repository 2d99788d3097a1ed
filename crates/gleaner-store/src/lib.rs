//! gleaner-store - the durable store service for captured connection lists.
//!
//! The store is the sole owner of the persisted repository state. All
//! mutation flows through a single service task, one request at a time, so
//! every merge is serialized by construction. Persistence backends implement
//! [`gleaner_core::StatePersistence`]: a file-backed single JSON document for
//! real use and an in-memory backend for tests.

pub mod cache;
pub mod file_store;
pub mod memory;
pub mod repository;
pub mod service;
pub mod sweeper;

pub use cache::TimeBoxed;
pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use repository::{IngestOutcome, Repository};
pub use service::{StoreHandle, StoreService};
pub use sweeper::{SweepConfig, spawn_sweeper};
