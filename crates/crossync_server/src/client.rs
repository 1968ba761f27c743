//! Blocking client for a remote sync service.

use crate::error::{ServerError, ServerResult};
use crossync_core::{EntityId, Record, UpdateOutcome, VersionToken};
use crossync_protocol::{
    frame_len, length_prefixed, EnsureExistsRequest, EvictRequest, FetchRequest,
    SubmitUpdateRequest, SyncMessage, FRAME_HEADER_SIZE, MAX_FRAME_SIZE,
};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// A connection to a sync service.
///
/// Requests are sent one at a time over a single TCP stream.
#[derive(Debug)]
pub struct SyncClient {
    stream: TcpStream,
    max_frame_size: usize,
}

impl SyncClient {
    /// Connects to a sync service.
    pub fn connect(addr: impl ToSocketAddrs) -> ServerResult<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            max_frame_size: MAX_FRAME_SIZE,
        })
    }

    /// Sets the read and write timeout. `None` blocks indefinitely.
    pub fn set_timeout(&self, timeout: Option<Duration>) -> ServerResult<()> {
        self.stream.set_read_timeout(timeout)?;
        self.stream.set_write_timeout(timeout)?;
        Ok(())
    }

    /// Submits `record`, computed from the state at `expected`.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the service could not write its store; the
    /// whole submission may be retried.
    pub fn submit_update(
        &mut self,
        record: Record,
        expected: Option<VersionToken>,
    ) -> ServerResult<UpdateOutcome> {
        let request = SyncMessage::SubmitUpdate(SubmitUpdateRequest::new(record, expected));
        match self.request(&request)? {
            SyncMessage::SubmitUpdateResponse(resp) => {
                if let Some(error) = resp.error {
                    Err(ServerError::StoreUnavailable(error))
                } else if resp.accepted {
                    Ok(UpdateOutcome::Accepted)
                } else {
                    Ok(UpdateOutcome::Rejected {
                        current_version: resp.current_version,
                    })
                }
            }
            other => Err(ServerError::UnexpectedMessage(other.type_code())),
        }
    }

    /// Reads the stored record, or the empty record if nothing is stored.
    pub fn fetch(&mut self, entity_id: EntityId) -> ServerResult<Record> {
        match self.request(&SyncMessage::Fetch(FetchRequest { entity_id }))? {
            SyncMessage::FetchResponse(resp) => match (resp.record, resp.error) {
                (_, Some(error)) => Err(ServerError::StoreUnavailable(error)),
                (Some(record), None) => Ok(record),
                (None, None) => Err(ServerError::Remote("fetch response without record".into())),
            },
            other => Err(ServerError::UnexpectedMessage(other.type_code())),
        }
    }

    /// Registers the entity. Returns whether this call created its row.
    pub fn ensure_exists(&mut self, entity_id: EntityId) -> ServerResult<bool> {
        match self.request(&SyncMessage::EnsureExists(EnsureExistsRequest { entity_id }))? {
            SyncMessage::EnsureExistsResponse(resp) => match resp.error {
                Some(error) => Err(ServerError::StoreUnavailable(error)),
                None => Ok(resp.created),
            },
            other => Err(ServerError::UnexpectedMessage(other.type_code())),
        }
    }

    /// Drops the entity from the service's cache.
    pub fn evict(&mut self, entity_id: EntityId) -> ServerResult<bool> {
        match self.request(&SyncMessage::Evict(EvictRequest { entity_id }))? {
            SyncMessage::EvictResponse(resp) => Ok(resp.evicted),
            other => Err(ServerError::UnexpectedMessage(other.type_code())),
        }
    }

    /// Sends a request and waits for its reply.
    ///
    /// An [`SyncMessage::Error`] reply is returned as `Remote`.
    pub fn request(&mut self, message: &SyncMessage) -> ServerResult<SyncMessage> {
        let body = message.encode()?;
        self.stream
            .write_all(&length_prefixed(&body, self.max_frame_size)?)?;

        let mut header = [0u8; FRAME_HEADER_SIZE];
        self.stream.read_exact(&mut header)?;
        let mut reply = vec![0u8; frame_len(header, self.max_frame_size)?];
        self.stream.read_exact(&mut reply)?;

        match SyncMessage::decode(&reply)? {
            SyncMessage::Error(error) => Err(ServerError::Remote(error.message)),
            reply => Ok(reply),
        }
    }
}
