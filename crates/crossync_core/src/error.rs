//! Error types for the sync coordinator.

use crate::store::StoreError;
use thiserror::Error;

/// Result type for coordinator operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by [`crate::SyncCoordinator`].
///
/// A stale write is not an error: it is reported as
/// [`crate::UpdateOutcome::Rejected`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// The entity identity is malformed or missing.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// The submitted record cannot be written.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The backing store reported a non-transport failure.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl SyncError {
    /// Returns true if the caller may retry the whole submission.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::StoreUnavailable(_))
    }

    /// Returns true if the request itself was malformed.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidIdentity(_) | SyncError::InvalidRecord(_)
        )
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(message) => SyncError::StoreUnavailable(message),
            other => SyncError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityId;

    #[test]
    fn unavailable_maps_to_distinct_variant() {
        let err: SyncError = StoreError::Unavailable("connection refused".into()).into();
        assert!(matches!(err, SyncError::StoreUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn other_store_errors_are_wrapped() {
        let err: SyncError = StoreError::MissingRow(EntityId::new()).into();
        assert!(matches!(err, SyncError::Store(StoreError::MissingRow(_))));
        assert!(!err.is_retryable());
    }

    #[test]
    fn classification() {
        assert!(SyncError::InvalidIdentity("nil".into()).is_caller_error());
        assert!(!SyncError::StoreUnavailable("down".into()).is_caller_error());
    }

    #[test]
    fn error_display() {
        let err = SyncError::StoreUnavailable("timeout".into());
        assert_eq!(err.to_string(), "store unavailable: timeout");
    }
}
