//! Protocol messages.

use crate::error::ProtocolResult;
use crate::frame::Frame;
use crossync_core::{EntityId, Record, VersionToken};
use serde::{Deserialize, Serialize};

/// A protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMessage {
    /// Submit update request.
    SubmitUpdate(SubmitUpdateRequest),
    /// Submit update response.
    SubmitUpdateResponse(SubmitUpdateResponse),
    /// Fetch request.
    Fetch(FetchRequest),
    /// Fetch response.
    FetchResponse(FetchResponse),
    /// Ensure-exists request.
    EnsureExists(EnsureExistsRequest),
    /// Ensure-exists response.
    EnsureExistsResponse(EnsureExistsResponse),
    /// Evict request.
    Evict(EvictRequest),
    /// Evict response.
    EvictResponse(EvictResponse),
    /// The request could not be understood.
    Error(ErrorResponse),
}

impl SyncMessage {
    /// Returns the message type code.
    pub fn type_code(&self) -> u8 {
        match self {
            SyncMessage::SubmitUpdate(_) => 1,
            SyncMessage::SubmitUpdateResponse(_) => 2,
            SyncMessage::Fetch(_) => 3,
            SyncMessage::FetchResponse(_) => 4,
            SyncMessage::EnsureExists(_) => 5,
            SyncMessage::EnsureExistsResponse(_) => 6,
            SyncMessage::Evict(_) => 7,
            SyncMessage::EvictResponse(_) => 8,
            SyncMessage::Error(_) => 0xFF,
        }
    }

    /// Returns true for messages sent by callers rather than the service.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            SyncMessage::SubmitUpdate(_)
                | SyncMessage::Fetch(_)
                | SyncMessage::EnsureExists(_)
                | SyncMessage::Evict(_)
        )
    }

    /// Returns the entity a request or response concerns, if any.
    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            SyncMessage::SubmitUpdate(req) => Some(req.entity_id),
            SyncMessage::Fetch(req) => Some(req.entity_id),
            SyncMessage::EnsureExists(req) => Some(req.entity_id),
            SyncMessage::Evict(req) => Some(req.entity_id),
            SyncMessage::FetchResponse(resp) => resp.record.as_ref().map(|r| r.entity_id),
            _ => None,
        }
    }

    /// Encodes the message in a versioned CBOR envelope.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Frame::encode_message(self)
    }

    /// Decodes a message from a CBOR envelope, checking the protocol version.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Frame::decode(bytes).map(Frame::into_message)
    }
}

/// Submits a record computed from the state at `expected_version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitUpdateRequest {
    /// Entity being updated. Must match `record.entity_id`.
    pub entity_id: EntityId,
    /// The new record.
    pub record: Record,
    /// Version the writer started from, `None` for the empty record.
    pub expected_version: Option<VersionToken>,
}

impl SubmitUpdateRequest {
    /// Creates a request for `record`.
    pub fn new(record: Record, expected_version: Option<VersionToken>) -> Self {
        Self {
            entity_id: record.entity_id,
            record,
            expected_version,
        }
    }
}

/// Outcome of a submitted update.
///
/// `accepted == false` with no `error` is a stale-version rejection: the
/// writer must discard its update. A set `error` means the submission failed
/// and may be retried as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitUpdateResponse {
    /// Whether the record was accepted.
    pub accepted: bool,
    /// The version that superseded the writer's view, when rejected.
    pub current_version: Option<VersionToken>,
    /// Failure description.
    pub error: Option<String>,
}

impl SubmitUpdateResponse {
    /// Creates an accepted response.
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            current_version: None,
            error: None,
        }
    }

    /// Creates a stale-version rejection.
    pub fn rejected(current_version: Option<VersionToken>) -> Self {
        Self {
            accepted: false,
            current_version,
            error: None,
        }
    }

    /// Creates a failed response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            current_version: None,
            error: Some(message.into()),
        }
    }

    /// Returns true for a stale-version rejection.
    pub fn is_rejected(&self) -> bool {
        !self.accepted && self.error.is_none()
    }
}

/// Reads the stored record of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Entity to read.
    pub entity_id: EntityId,
}

/// The stored record, or the empty record when nothing is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    /// The record, absent only when `error` is set.
    pub record: Option<Record>,
    /// Failure description.
    pub error: Option<String>,
}

impl FetchResponse {
    /// Creates a successful response.
    pub fn found(record: Record) -> Self {
        Self {
            record: Some(record),
            error: None,
        }
    }

    /// Creates a failed response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            record: None,
            error: Some(message.into()),
        }
    }
}

/// Registers an entity with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsureExistsRequest {
    /// Entity to register.
    pub entity_id: EntityId,
}

/// Result of registering an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsureExistsResponse {
    /// Whether this request created the identity row.
    pub created: bool,
    /// Failure description.
    pub error: Option<String>,
}

impl EnsureExistsResponse {
    /// Creates a successful response.
    pub fn success(created: bool) -> Self {
        Self {
            created,
            error: None,
        }
    }

    /// Creates a failed response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            created: false,
            error: Some(message.into()),
        }
    }
}

/// Drops an entity from the service's cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictRequest {
    /// Entity to evict.
    pub entity_id: EntityId,
}

/// Result of an eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictResponse {
    /// Whether a cache entry was present.
    pub evicted: bool,
}

/// Reply to input the service could not handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Failure description.
    pub message: String,
}

impl ErrorResponse {
    /// Creates an error response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crossync_core::Timestamp;

    fn record() -> Record {
        Record::new(EntityId::new(), VersionToken::new(), "inventory")
            .stamped(Timestamp::from_millis(1_700_000_000_000))
    }

    #[test]
    fn submit_update_roundtrip() {
        let record = record();
        let message = SyncMessage::SubmitUpdate(SubmitUpdateRequest::new(
            record.clone(),
            Some(VersionToken::new()),
        ));

        let decoded = SyncMessage::decode(&message.encode().unwrap()).unwrap();
        assert_eq!(decoded, message);
        match decoded {
            SyncMessage::SubmitUpdate(req) => {
                assert_eq!(req.entity_id, record.entity_id);
                assert_eq!(req.record, record);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn fetch_response_carries_empty_record() {
        let id = EntityId::new();
        let message = SyncMessage::FetchResponse(FetchResponse::found(Record::empty(id)));
        let decoded = SyncMessage::decode(&message.encode().unwrap()).unwrap();

        let SyncMessage::FetchResponse(resp) = decoded else {
            panic!("expected fetch response");
        };
        let record = resp.record.unwrap();
        assert!(record.is_empty());
        assert_eq!(record.entity_id, id);
    }

    #[test]
    fn rejection_is_not_an_error() {
        let rejected = SubmitUpdateResponse::rejected(Some(VersionToken::new()));
        assert!(rejected.is_rejected());
        assert!(!SubmitUpdateResponse::accepted().is_rejected());
        assert!(!SubmitUpdateResponse::error("store down").is_rejected());
    }

    #[test]
    fn type_codes_are_distinct() {
        let id = EntityId::new();
        let messages = [
            SyncMessage::SubmitUpdate(SubmitUpdateRequest::new(record(), None)),
            SyncMessage::SubmitUpdateResponse(SubmitUpdateResponse::accepted()),
            SyncMessage::Fetch(FetchRequest { entity_id: id }),
            SyncMessage::FetchResponse(FetchResponse::error("x")),
            SyncMessage::EnsureExists(EnsureExistsRequest { entity_id: id }),
            SyncMessage::EnsureExistsResponse(EnsureExistsResponse::success(true)),
            SyncMessage::Evict(EvictRequest { entity_id: id }),
            SyncMessage::EvictResponse(EvictResponse { evicted: false }),
            SyncMessage::Error(ErrorResponse::new("x")),
        ];

        let mut codes: Vec<_> = messages.iter().map(SyncMessage::type_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), messages.len());
        assert_eq!(messages.iter().filter(|m| m.is_request()).count(), 4);
    }

    #[test]
    fn request_entity_ids() {
        let id = EntityId::new();
        assert_eq!(
            SyncMessage::Evict(EvictRequest { entity_id: id }).entity_id(),
            Some(id)
        );
        assert_eq!(
            SyncMessage::EvictResponse(EvictResponse { evicted: true }).entity_id(),
            None
        );
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = SyncMessage::decode(&[0xff, 0x00, 0x13]).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }
}
