//! Error types for the sync server and client.

use crossync_core::SyncError;
use crossync_protocol::ProtocolError;
use std::time::Duration;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server or client.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Coordinator error.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Encoding, decoding or framing error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The service could not reach its store; the submission may be retried.
    #[error("service store unavailable: {0}")]
    StoreUnavailable(String),

    /// The service answered with an error message.
    #[error("remote error: {0}")]
    Remote(String),

    /// The peer sent a message of the wrong type.
    #[error("unexpected message type {0}")]
    UnexpectedMessage(u8),

    /// A request did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The service has stopped and no longer serves requests.
    #[error("service is shutting down")]
    ShuttingDown,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns true if the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            ServerError::InvalidRequest(_)
            | ServerError::Protocol(_)
            | ServerError::UnexpectedMessage(_) => true,
            ServerError::Sync(err) => err.is_caller_error(),
            _ => false,
        }
    }

    /// Returns true if the whole request may be retried as is.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServerError::StoreUnavailable(_)
            | ServerError::Timeout(_)
            | ServerError::ShuttingDown
            | ServerError::Io(_) => true,
            ServerError::Sync(err) => err.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServerError::InvalidRequest("bad".into()).is_client_error());
        assert!(ServerError::Sync(SyncError::InvalidRecord("no version".into())).is_client_error());
        assert!(!ServerError::Internal("oops".into()).is_client_error());

        assert!(ServerError::StoreUnavailable("down".into()).is_retryable());
        assert!(ServerError::Sync(SyncError::StoreUnavailable("down".into())).is_retryable());
        assert!(!ServerError::InvalidRequest("bad".into()).is_retryable());
        assert!(ServerError::ShuttingDown.is_retryable());
        assert!(!ServerError::ShuttingDown.is_client_error());
    }

    #[test]
    fn protocol_errors_convert() {
        let err: ServerError = ProtocolError::Decode("truncated".into()).into();
        assert!(matches!(err, ServerError::Protocol(_)));
        assert!(err.to_string().contains("truncated"));
    }
}
