//! Conflict-aware update protocol.
//!
//! A writer submits a new [`Record`] together with the version it believes
//! is current. The coordinator compares that expectation against its
//! [`VersionCache`]; a mismatch means another writer already advanced the
//! entity and the submission is rejected. Accepted records go into the
//! cache immediately and are then written through to the store.
//!
//! ```text
//! submit_update(record, expected)
//!   lock(entity)
//!   cached.version != expected  -> Rejected
//!   cache.put(record)
//!   store: data row exists ? update(_if) : insert
//!   unlock(entity)              -> Accepted
//! ```
//!
//! The per-entity lock is held across the store write so that update and
//! insert calls for one entity never interleave. The cache lock is only
//! taken for the individual `get`/`put` calls.

mod locks;
mod stats;

pub use stats::CoordinatorStats;

use crate::cache::VersionCache;
use crate::config::CoordinatorConfig;
use crate::entity::{EntityId, Record, Timestamp, VersionToken};
use crate::error::{SyncError, SyncResult};
use crate::store::RecordStore;
use locks::EntityLocks;
use stats::AtomicStats;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of [`SyncCoordinator::submit_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The record was cached and written to the store.
    Accepted,
    /// The caller's view was stale. Discard the update; do not retry it as is.
    Rejected {
        /// The version that superseded the caller's expectation, if known.
        current_version: Option<VersionToken>,
    },
}

impl UpdateOutcome {
    /// Returns true for [`UpdateOutcome::Accepted`].
    pub fn is_accepted(&self) -> bool {
        matches!(self, UpdateOutcome::Accepted)
    }
}

/// Serves reads and versioned updates for one process.
///
/// Several coordinators (one per process) may share a store. Each owns its
/// cache, which only protects against races inside that process; enable
/// [`CoordinatorConfig::conditional_writes`] to have the store reject stale
/// writes coming from other processes as well.
///
/// # Example
///
/// ```rust
/// use crossync_core::{EntityId, InMemoryStore, Record, SyncCoordinator, VersionToken};
/// use std::sync::Arc;
///
/// let coordinator = SyncCoordinator::with_store(Arc::new(InMemoryStore::new()));
/// let id = EntityId::new();
/// coordinator.ensure_exists(id).unwrap();
///
/// let v1 = VersionToken::new();
/// let outcome = coordinator
///     .submit_update(Record::new(id, v1, "a"), None)
///     .unwrap();
/// assert!(outcome.is_accepted());
/// assert_eq!(coordinator.fetch(id).unwrap().version, Some(v1));
/// ```
pub struct SyncCoordinator<S: RecordStore> {
    config: CoordinatorConfig,
    store: Arc<S>,
    cache: Arc<VersionCache>,
    locks: EntityLocks,
    stats: AtomicStats,
}

impl<S: RecordStore> SyncCoordinator<S> {
    /// Creates a coordinator over an existing store and cache.
    pub fn new(config: CoordinatorConfig, store: Arc<S>, cache: Arc<VersionCache>) -> Self {
        Self {
            config,
            store,
            cache,
            locks: EntityLocks::new(),
            stats: AtomicStats::default(),
        }
    }

    /// Creates a coordinator with default configuration and a fresh cache.
    pub fn with_store(store: Arc<S>) -> Self {
        Self::new(
            CoordinatorConfig::default(),
            store,
            Arc::new(VersionCache::new()),
        )
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the cache.
    pub fn cache(&self) -> &Arc<VersionCache> {
        &self.cache
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> CoordinatorStats {
        self.stats.snapshot()
    }

    /// Registers the entity in the store if it has no identity row yet.
    ///
    /// Returns `true` if this call created the row. Concurrent callers are
    /// safe: a `DuplicateKey` from the store counts as success once a
    /// follow-up read confirms the row.
    pub fn ensure_exists(&self, entity_id: EntityId) -> SyncResult<bool> {
        check_identity(entity_id)?;
        self.register(entity_id)
    }

    /// Reads the entity's record from the store.
    ///
    /// Returns [`Record::empty`] when nothing is stored. The cache is
    /// neither consulted nor modified: another process may have written the
    /// store since this process last saw the entity.
    pub fn fetch(&self, entity_id: EntityId) -> SyncResult<Record> {
        check_identity(entity_id)?;
        let record = self.store.read_record(entity_id)?;
        Ok(record.unwrap_or_else(|| Record::empty(entity_id)))
    }

    /// Returns the cached record, if any.
    pub fn cached(&self, entity_id: EntityId) -> Option<Record> {
        self.cache.get(entity_id)
    }

    /// Drops the entity from the cache.
    ///
    /// The next submission for it is checked against the store only.
    /// Returns whether an entry was present.
    pub fn evict(&self, entity_id: EntityId) -> bool {
        let _guard = self.locks.lock(entity_id);
        let evicted = self.cache.remove(entity_id).is_some();
        debug!(entity = %entity_id, evicted, "evicted cache entry");
        evicted
    }

    /// Submits a new record, computed from the state at version `expected`.
    ///
    /// `expected` is `None` when the writer started from the empty record.
    ///
    /// # Errors
    ///
    /// - `InvalidIdentity` / `InvalidRecord` before the cache or store is touched
    /// - `StoreUnavailable` if the write could not reach the store. The cache
    ///   keeps the submitted record; the caller must retry the whole
    ///   submission.
    pub fn submit_update(
        &self,
        record: Record,
        expected: Option<&VersionToken>,
    ) -> SyncResult<UpdateOutcome> {
        check_identity(record.entity_id)?;
        self.check_record(&record, expected)?;

        let entity_id = record.entity_id;
        let _guard = self.locks.lock(entity_id);

        let cached = self.cache.get(entity_id);
        if let Some(current) = &cached {
            if current.version.as_ref() != expected {
                debug!(
                    entity = %entity_id,
                    cached = ?current.version,
                    expected = ?expected,
                    "rejected stale update"
                );
                self.stats.record_rejected();
                return Ok(UpdateOutcome::Rejected {
                    current_version: current.version,
                });
            }
        }

        // Timestamps never move backwards for an entity, even if the clock does.
        let now = Timestamp::now();
        let timestamp = cached.map_or(now, |c| now.max(c.timestamp));
        let record = record.stamped(timestamp);
        self.cache.put(record.clone());

        match self.write_through(&record, expected) {
            Ok(true) => {
                self.stats.record_accepted();
                debug!(entity = %entity_id, version = ?record.version, "accepted update");
                Ok(UpdateOutcome::Accepted)
            }
            Ok(false) => {
                self.stats.record_store_conflict();
                let current_version = self.resync(entity_id);
                warn!(
                    entity = %entity_id,
                    expected = ?expected,
                    stored = ?current_version,
                    "store rejected stale update"
                );
                Ok(UpdateOutcome::Rejected { current_version })
            }
            Err(err) => {
                if err.is_retryable() {
                    self.stats.record_store_failure();
                }
                warn!(entity = %entity_id, error = %err, "store write failed");
                Err(err)
            }
        }
    }

    /// Writes an accepted record. Returns `false` on a store-side conflict.
    fn write_through(&self, record: &Record, expected: Option<&VersionToken>) -> SyncResult<bool> {
        let entity_id = record.entity_id;
        if self.store.record_exists(entity_id)? {
            return self.update_existing(record, expected);
        }
        if self.config.conditional_writes && expected.is_some() {
            // Nothing stored, so no version can match.
            return Ok(false);
        }

        self.register(entity_id)?;
        match self.store.insert_record(record) {
            Ok(()) => Ok(true),
            Err(err) if err.is_duplicate_key() => {
                debug!(entity = %entity_id, "data row created concurrently, updating instead");
                self.update_existing(record, expected)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_existing(&self, record: &Record, expected: Option<&VersionToken>) -> SyncResult<bool> {
        if self.config.conditional_writes {
            Ok(self.store.update_record_if(record, expected)?)
        } else {
            self.store.update_record(record)?;
            Ok(true)
        }
    }

    fn register(&self, entity_id: EntityId) -> SyncResult<bool> {
        if self.store.row_exists(entity_id)? {
            return Ok(false);
        }
        match self.store.insert_row(entity_id) {
            Ok(()) => {
                info!(entity = %entity_id, "registered entity");
                Ok(true)
            }
            Err(err) if err.is_duplicate_key() => {
                if self.store.row_exists(entity_id)? {
                    debug!(entity = %entity_id, "entity registered concurrently");
                    Ok(false)
                } else {
                    Err(err.into())
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Replaces the optimistic cache entry with what the store holds.
    fn resync(&self, entity_id: EntityId) -> Option<VersionToken> {
        match self.store.read_record(entity_id) {
            Ok(Some(current)) => {
                let version = current.version;
                self.cache.put(current);
                version
            }
            Ok(None) => {
                self.cache.remove(entity_id);
                None
            }
            Err(err) => {
                warn!(entity = %entity_id, error = %err, "could not reload record, evicting");
                self.cache.remove(entity_id);
                None
            }
        }
    }

    fn check_record(&self, record: &Record, expected: Option<&VersionToken>) -> SyncResult<()> {
        let Some(version) = record.version.as_ref() else {
            return Err(SyncError::InvalidRecord(
                "record has no version token".into(),
            ));
        };
        if Some(version) == expected {
            return Err(SyncError::InvalidRecord(format!(
                "version {version} was not changed by the update"
            )));
        }
        if record.payload.len() > self.config.max_payload_bytes {
            return Err(SyncError::InvalidRecord(format!(
                "payload of {} bytes exceeds limit of {}",
                record.payload.len(),
                self.config.max_payload_bytes
            )));
        }
        Ok(())
    }
}

fn check_identity(entity_id: EntityId) -> SyncResult<()> {
    if entity_id.is_valid() {
        Ok(())
    } else {
        Err(SyncError::InvalidIdentity("nil entity id".into()))
    }
}
