//! Last-known-version cache.

use crate::entity::{EntityId, Record, VersionToken};
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory map from entity identity to its most recently known [`Record`].
///
/// The cache accelerates the conflict check in
/// [`SyncCoordinator::submit_update`](crate::SyncCoordinator::submit_update);
/// it is never the authority for reads. It is keyed by value equality on
/// [`EntityId`], so two `Record` instances describing the same entity
/// always occupy the same slot.
///
/// A cache is an owned instance: construct it at service start, hand it to
/// coordinators behind an `Arc`, and [`clear`](Self::clear) it at shutdown.
///
/// # Thread Safety
///
/// `get`, `put` and `remove` are each atomic with respect to one another.
/// Sequences of calls are not; coordinators serialize those per entity.
#[derive(Debug, Default)]
pub struct VersionCache {
    entries: RwLock<HashMap<EntityId, Record>>,
}

impl VersionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the cached record for an entity.
    #[must_use]
    pub fn get(&self, entity_id: EntityId) -> Option<Record> {
        self.entries.read().get(&entity_id).cloned()
    }

    /// Returns the cached version for an entity.
    ///
    /// The outer `Option` is `None` on a cache miss.
    #[must_use]
    pub fn version_of(&self, entity_id: EntityId) -> Option<Option<VersionToken>> {
        self.entries.read().get(&entity_id).map(|r| r.version)
    }

    /// Replaces the cached record for `record.entity_id`.
    pub fn put(&self, record: Record) {
        self.entries.write().insert(record.entity_id, record);
    }

    /// Removes the cached record, returning it if present.
    pub fn remove(&self, entity_id: EntityId) -> Option<Record> {
        self.entries.write().remove(&entity_id)
    }

    /// Returns whether an entity has a cached record.
    #[must_use]
    pub fn contains(&self, entity_id: EntityId) -> bool {
        self.entries.read().contains_key(&entity_id)
    }

    /// Number of cached entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
