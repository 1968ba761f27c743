//! The synchronized record snapshot.

use super::{EntityId, Timestamp, VersionToken};
use serde::{Deserialize, Serialize};

/// A versioned snapshot of an entity's mutable state.
///
/// The payload is opaque to this crate; producers serialize their domain
/// state (inventories, status effects, ...) into it and deserialize it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identity of the entity this record belongs to.
    pub entity_id: EntityId,
    /// Version assigned by the producer, `None` for a record never written.
    pub version: Option<VersionToken>,
    /// Serialized domain state.
    pub payload: Vec<u8>,
    /// Last write time, assigned when the record is written.
    pub timestamp: Timestamp,
}

impl Record {
    /// Creates a record produced by a writer. The timestamp is assigned on write.
    #[must_use]
    pub fn new(entity_id: EntityId, version: VersionToken, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            entity_id,
            version: Some(version),
            payload: payload.into(),
            timestamp: Timestamp::ZERO,
        }
    }

    /// The default record returned for an entity without stored data.
    #[must_use]
    pub fn empty(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            version: None,
            payload: Vec::new(),
            timestamp: Timestamp::ZERO,
        }
    }

    /// Returns true if this is the default record (no version token).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.version.is_none()
    }

    /// Returns a copy stamped with the given write time.
    #[must_use]
    pub fn stamped(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_has_defaults() {
        let id = EntityId::new();
        let record = Record::empty(id);
        assert_eq!(record.entity_id, id);
        assert!(record.is_empty());
        assert!(record.payload.is_empty());
        assert_eq!(record.timestamp, Timestamp::ZERO);
    }

    #[test]
    fn new_record_carries_version() {
        let version = VersionToken::new();
        let record = Record::new(EntityId::new(), version, "inventory");
        assert!(!record.is_empty());
        assert_eq!(record.version, Some(version));
        assert_eq!(record.payload, b"inventory");
    }

    #[test]
    fn stamped_sets_timestamp() {
        let record = Record::new(EntityId::new(), VersionToken::new(), vec![1, 2])
            .stamped(Timestamp::from_millis(99));
        assert_eq!(record.timestamp.as_millis(), 99);
    }
}
