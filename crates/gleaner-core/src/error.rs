//! Error types for the gleaner crates.
//!
//! This module provides a unified error type with explicit variants for
//! persistence, capacity, delivery, and input validation errors.

use std::fmt;
use thiserror::Error;

use crate::types::{AccountName, RelationKind};

/// The unified error type for gleaner operations.
///
/// Every failure is terminal for the call that produced it; there is no
/// retry machinery anywhere in the pipeline. Variants exist so callers can
/// distinguish the one user-visible case (capacity) from the silent ones.
#[derive(Debug, Error)]
pub enum Error {
    /// Durable-store read/write errors.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// A capacity ceiling would be exceeded; the write was rejected whole.
    #[error("capacity exceeded: {0}")]
    Capacity(#[from] CapacityError),

    /// The store channel is gone (service shut down or never started).
    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Input validation errors (invalid account name, user id, URL).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Persistence-level errors from the durable state document.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading the state document failed.
    #[error("read failed: {message}")]
    Read { message: String },

    /// Writing the state document failed.
    #[error("write failed: {message}")]
    Write { message: String },

    /// The state document could not be encoded or decoded.
    #[error("codec failed: {message}")]
    Codec { message: String },
}

/// A capacity ceiling violation.
///
/// Carries enough context for the limit indicator and diagnostics to say
/// which ceiling tripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    /// The per-account-per-relation record ceiling.
    PerRelation {
        account: AccountName,
        kind: RelationKind,
        limit: usize,
        attempted: usize,
    },

    /// The global record-count ceiling across all accounts and kinds.
    GlobalCount { limit: usize, attempted: usize },

    /// The serialized-size ceiling of the persisted state document.
    StateBytes { limit: usize, attempted: usize },
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityError::PerRelation {
                account,
                kind,
                limit,
                attempted,
            } => write!(
                f,
                "{} {} would hold {} records (limit {})",
                account, kind, attempted, limit
            ),
            CapacityError::GlobalCount { limit, attempted } => {
                write!(f, "store would hold {} records (limit {})", attempted, limit)
            }
            CapacityError::StateBytes { limit, attempted } => {
                write!(f, "state would be {} bytes (limit {})", attempted, limit)
            }
        }
    }
}

impl std::error::Error for CapacityError {}

/// Delivery errors on the Relay -> Store channel.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The store service's request channel is closed.
    #[error("store channel closed")]
    ChannelClosed,

    /// The store service dropped the reply without answering.
    #[error("store reply dropped")]
    ReplyDropped,
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid account name.
    #[error("invalid account name '{value}': {reason}")]
    AccountName { value: String, reason: String },

    /// Invalid user id.
    #[error("invalid user id '{value}': {reason}")]
    UserId { value: String, reason: String },

    /// Unknown relation kind.
    #[error("unknown relation kind '{value}'")]
    RelationKind { value: String },

    /// A URL that does not name a relation page.
    #[error("invalid page URL '{value}': {reason}")]
    PageUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
