//! Error types for store operations.

use crate::entity::EntityId;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in a [`super::RecordStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connectivity or transport failure; nothing was written.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A row keyed by this entity already exists.
    #[error("duplicate key: {0}")]
    DuplicateKey(EntityId),

    /// The row this operation requires does not exist.
    #[error("missing row: {0}")]
    MissingRow(EntityId),

    /// Persisted state could not be decoded.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Returns true if this is a uniqueness violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey(_))
    }
}
