//! Versioned envelope and stream framing.

use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::SyncMessage;
use crate::PROTOCOL_VERSION;
use serde::{Deserialize, Serialize};

/// Size of the big-endian length prefix.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Largest accepted frame body (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// A message together with the protocol version it was encoded with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Protocol version of the sender.
    pub version: u16,
    /// The carried message.
    pub message: SyncMessage,
}

/// Borrowed form of [`Frame`] used for encoding without cloning.
#[derive(Serialize)]
struct FrameRef<'a> {
    version: u16,
    message: &'a SyncMessage,
}

/// Just the version field, decoded before the message body.
#[derive(Deserialize)]
struct FrameVersion {
    version: u16,
}

impl Frame {
    /// Wraps a message with the current protocol version.
    pub fn new(message: SyncMessage) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            message,
        }
    }

    /// Returns the carried message.
    pub fn into_message(self) -> SyncMessage {
        self.message
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        encode_cbor(&FrameRef {
            version: self.version,
            message: &self.message,
        })
    }

    /// Encodes a message with the current protocol version.
    pub(crate) fn encode_message(message: &SyncMessage) -> ProtocolResult<Vec<u8>> {
        encode_cbor(&FrameRef {
            version: PROTOCOL_VERSION,
            message,
        })
    }

    /// Decodes from CBOR.
    ///
    /// The version is checked before the message, so a peer speaking another
    /// version gets `VersionMismatch` even if its messages have a different
    /// shape.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        if bytes.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: bytes.len(),
                max: MAX_FRAME_SIZE,
            });
        }

        let header: FrameVersion =
            ciborium::from_reader(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))?;
        if header.version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: header.version,
            });
        }

        ciborium::from_reader(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

fn encode_cbor<T: Serialize>(value: &T) -> ProtocolResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| ProtocolError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Prepends the length prefix to an encoded body.
///
/// # Errors
///
/// Returns `FrameTooLarge` if the body exceeds `max`.
pub fn length_prefixed(body: &[u8], max: usize) -> ProtocolResult<Vec<u8>> {
    let len = u32::try_from(body.len())
        .ok()
        .filter(|_| body.len() <= max)
        .ok_or(ProtocolError::FrameTooLarge {
            size: body.len(),
            max,
        })?;

    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + body.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(body);
    Ok(out)
}

/// Reads the body length from a frame header.
///
/// # Errors
///
/// Returns `FrameTooLarge` if the announced length exceeds `max`. Callers
/// should drop the connection: the oversized body is not consumed.
pub fn frame_len(header: [u8; FRAME_HEADER_SIZE], max: usize) -> ProtocolResult<usize> {
    let size = u32::from_be_bytes(header) as usize;
    if size > max {
        return Err(ProtocolError::FrameTooLarge { size, max });
    }
    Ok(size)
}
