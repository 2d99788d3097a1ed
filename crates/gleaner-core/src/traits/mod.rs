//! Core traits for storage backends.

mod persistence;

pub use persistence::StatePersistence;
