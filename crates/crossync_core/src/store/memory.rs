//! In-memory store for testing and single-process deployments.

use super::backend::RecordStore;
use super::error::{StoreError, StoreResult};
use super::table::StoreTable;
use crate::entity::{EntityId, Record, VersionToken};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Counts of mutating calls that reached an [`InMemoryStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounters {
    /// Identity rows created.
    pub rows_inserted: u64,
    /// Data rows created.
    pub records_inserted: u64,
    /// Data rows overwritten (plain or conditional).
    pub records_updated: u64,
    /// Conditional updates refused because of a version mismatch.
    pub conditional_misses: u64,
}

/// An in-memory [`RecordStore`].
///
/// This store keeps the shared [`StoreTable`] behind a mutex and is suitable for:
/// - Unit and integration tests
/// - Several coordinators in one process sharing a single store
///
/// Availability can be switched off to simulate a lost connection: every
/// call then fails with [`StoreError::Unavailable`] and nothing is written.
///
/// # Example
///
/// ```rust
/// use crossync_core::{EntityId, InMemoryStore, RecordStore};
///
/// let store = InMemoryStore::new();
/// let id = EntityId::new();
/// store.insert_row(id).unwrap();
/// assert!(store.row_exists(id).unwrap());
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    table: Mutex<StoreTable>,
    available: AtomicBool,
    rows_inserted: AtomicU64,
    records_inserted: AtomicU64,
    records_updated: AtomicU64,
    conditional_misses: AtomicU64,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_table(StoreTable::new())
    }

    /// Creates a store with pre-existing rows.
    #[must_use]
    pub fn with_table(table: StoreTable) -> Self {
        Self {
            table: Mutex::new(table),
            available: AtomicBool::new(true),
            rows_inserted: AtomicU64::new(0),
            records_inserted: AtomicU64::new(0),
            records_updated: AtomicU64::new(0),
            conditional_misses: AtomicU64::new(0),
        }
    }

    /// Simulates losing or regaining the store connection.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns a copy of the persisted tables.
    #[must_use]
    pub fn table(&self) -> StoreTable {
        self.table.lock().clone()
    }

    /// Returns the mutation counters.
    #[must_use]
    pub fn counters(&self) -> StoreCounters {
        StoreCounters {
            rows_inserted: self.rows_inserted.load(Ordering::Relaxed),
            records_inserted: self.records_inserted.load(Ordering::Relaxed),
            records_updated: self.records_updated.load(Ordering::Relaxed),
            conditional_misses: self.conditional_misses.load(Ordering::Relaxed),
        }
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store offline".into()))
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryStore {
    fn row_exists(&self, entity_id: EntityId) -> StoreResult<bool> {
        self.check_available()?;
        Ok(self.table.lock().row_exists(entity_id))
    }

    fn insert_row(&self, entity_id: EntityId) -> StoreResult<()> {
        self.check_available()?;
        self.table.lock().insert_row(entity_id)?;
        self.rows_inserted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn read_record(&self, entity_id: EntityId) -> StoreResult<Option<Record>> {
        self.check_available()?;
        Ok(self.table.lock().read_record(entity_id))
    }

    fn record_exists(&self, entity_id: EntityId) -> StoreResult<bool> {
        self.check_available()?;
        Ok(self.table.lock().record_exists(entity_id))
    }

    fn insert_record(&self, record: &Record) -> StoreResult<()> {
        self.check_available()?;
        self.table.lock().insert_record(record)?;
        self.records_inserted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn update_record(&self, record: &Record) -> StoreResult<()> {
        self.check_available()?;
        self.table.lock().update_record(record)?;
        self.records_updated.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn update_record_if(
        &self,
        record: &Record,
        expected: Option<&VersionToken>,
    ) -> StoreResult<bool> {
        self.check_available()?;
        let written = self.table.lock().update_record_if(record, expected)?;
        let counter = if written {
            &self.records_updated
        } else {
            &self.conditional_misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(written)
    }
}
