//! # crossync Protocol
//!
//! Messages exchanged between remote servers and a crossync service.
//!
//! This crate provides:
//! - [`SyncMessage`] and its request/response bodies
//! - CBOR encoding of messages inside a versioned envelope
//! - Length-prefix framing helpers for byte streams
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Wire format
//!
//! ```text
//! frame := length (u32 big-endian) || body
//! body  := CBOR { version: u16, message: SyncMessage }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod error;
mod frame;
mod messages;

pub use error::{ProtocolError, ProtocolResult};
pub use frame::{frame_len, length_prefixed, Frame, FRAME_HEADER_SIZE, MAX_FRAME_SIZE};
pub use messages::{
    EnsureExistsRequest, EnsureExistsResponse, ErrorResponse, EvictRequest, EvictResponse,
    FetchRequest, FetchResponse, SubmitUpdateRequest, SubmitUpdateResponse, SyncMessage,
};

/// Protocol version spoken by this crate.
pub const PROTOCOL_VERSION: u16 = 1;
