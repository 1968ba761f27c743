//! Error types for protocol encoding and decoding.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding, decoding or framing messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A message could not be encoded.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Bytes did not decode to a message.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The peer speaks another protocol version.
    #[error("protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version spoken locally.
        expected: u16,
        /// Version found in the envelope.
        actual: u16,
    },

    /// A frame exceeds the size limit.
    #[error("frame of {size} bytes exceeds limit of {max}")]
    FrameTooLarge {
        /// Announced or actual body size.
        size: usize,
        /// Configured limit.
        max: usize,
    },
}

impl ProtocolError {
    /// Returns true if the connection can no longer be trusted to be in sync
    /// and should be closed after replying.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProtocolError::FrameTooLarge { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_mismatch_display() {
        let err = ProtocolError::VersionMismatch {
            expected: 1,
            actual: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains('1'));
        assert!(msg.contains('7'));
    }

    #[test]
    fn only_oversized_frames_are_fatal() {
        assert!(ProtocolError::FrameTooLarge { size: 10, max: 5 }.is_fatal());
        assert!(!ProtocolError::Decode("bad".into()).is_fatal());
    }
}
