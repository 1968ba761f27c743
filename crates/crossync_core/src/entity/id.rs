//! Entity identifier.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identity of a synchronized entity (for example, a player).
///
/// Entity IDs are 128-bit UUIDs that are:
/// - Immutable for the lifetime of the entity
/// - Compared by value, never by reference
/// - Never nil (the nil UUID is treated as a malformed identity)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Creates an entity ID from raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Creates a new random entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entity ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Converts to a UUID.
    #[must_use]
    pub const fn to_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if this identity can address an entity.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.is_nil()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s.trim())
            .map_err(|e| SyncError::InvalidIdentity(format!("{s:?}: {e}")))?;
        let id = Self(uuid);
        if !id.is_valid() {
            return Err(SyncError::InvalidIdentity("nil entity id".into()));
        }
        Ok(id)
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl From<EntityId> for Uuid {
    fn from(id: EntityId) -> Self {
        id.to_uuid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unique() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn equality_is_by_value() {
        let bytes = [7u8; 16];
        let a = EntityId::from_bytes(bytes);
        let b = EntityId::from_uuid(Uuid::from_bytes(bytes));
        assert_eq!(a, b);
        assert_eq!(*a.as_bytes(), bytes);
    }

    #[test]
    fn parse_roundtrip() {
        let id = EntityId::new();
        let parsed: EntityId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_garbage_and_nil() {
        assert!(matches!(
            "not-a-uuid".parse::<EntityId>(),
            Err(SyncError::InvalidIdentity(_))
        ));
        assert!(matches!(
            Uuid::nil().to_string().parse::<EntityId>(),
            Err(SyncError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn nil_is_invalid() {
        assert!(!EntityId::from_bytes([0; 16]).is_valid());
        assert!(EntityId::new().is_valid());
    }
}
