//! Per-entity mutual exclusion.

use crate::entity::EntityId;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of one mutex per entity currently being written.
///
/// Slots are created on first use and dropped when the last holder or
/// waiter releases them, so the registry only ever contains entities with
/// an update in flight. The registry map itself is locked only long enough
/// to find or create a slot; writers of different entities never wait on
/// each other's updates.
#[derive(Debug, Default)]
pub(crate) struct EntityLocks {
    slots: Mutex<HashMap<EntityId, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Blocks until the caller holds the lock for `entity_id`.
    pub(crate) fn lock(&self, entity_id: EntityId) -> EntityGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(entity_id).or_default())
        };
        let guard = slot.lock_arc();
        EntityGuard {
            locks: self,
            entity_id,
            slot,
            guard: Some(guard),
        }
    }

    /// Number of entities with a live slot.
    #[cfg(test)]
    pub(crate) fn active(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Holds one entity's lock; releases it and prunes the slot on drop.
pub(crate) struct EntityGuard<'a> {
    locks: &'a EntityLocks,
    entity_id: EntityId,
    slot: Arc<Mutex<()>>,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl Drop for EntityGuard<'_> {
    fn drop(&mut self) {
        let mut slots = self.locks.slots.lock();
        // Release while holding the registry so no new waiter can clone the
        // slot between the unlock and the strong-count check.
        self.guard.take();
        // One reference in the map, one in this guard: nobody else waits.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.entity_id);
        }
    }
}
