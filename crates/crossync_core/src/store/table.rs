//! Two-table persisted layout shared by store implementations.

use super::error::{StoreError, StoreResult};
use crate::entity::{EntityId, Record, Timestamp, VersionToken};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Surrogate key of an identity row.
pub type RowId = u64;

/// The data row linked to an identity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRow {
    /// Version of the stored record.
    pub version: Option<VersionToken>,
    /// Serialized domain state.
    pub payload: Vec<u8>,
    /// Last write time.
    pub timestamp: Timestamp,
}

/// Identity table plus data table, linked by [`RowId`].
///
/// ```text
/// identities: EntityId -> RowId
/// data:       RowId    -> DataRow
/// ```
///
/// Both tables are unique on their key, which is what makes concurrent
/// `insert_row`/`insert_record` calls fail with `DuplicateKey` instead of
/// producing a second row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTable {
    identities: BTreeMap<EntityId, RowId>,
    data: BTreeMap<RowId, DataRow>,
    next_row_id: RowId,
}

impl StoreTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether an identity row exists.
    pub fn row_exists(&self, entity_id: EntityId) -> bool {
        self.identities.contains_key(&entity_id)
    }

    /// Creates an identity row and returns its row id.
    pub fn insert_row(&mut self, entity_id: EntityId) -> StoreResult<RowId> {
        if self.identities.contains_key(&entity_id) {
            return Err(StoreError::DuplicateKey(entity_id));
        }
        self.next_row_id += 1;
        let row_id = self.next_row_id;
        self.identities.insert(entity_id, row_id);
        Ok(row_id)
    }

    /// Reads the record for an entity by joining both tables.
    pub fn read_record(&self, entity_id: EntityId) -> Option<Record> {
        let row = self.data_row(entity_id)?;
        Some(Record {
            entity_id,
            version: row.version,
            payload: row.payload.clone(),
            timestamp: row.timestamp,
        })
    }

    /// Returns whether a data row exists.
    pub fn record_exists(&self, entity_id: EntityId) -> bool {
        self.data_row(entity_id).is_some()
    }

    /// Inserts the data row for a record.
    pub fn insert_record(&mut self, record: &Record) -> StoreResult<()> {
        let row_id = self.row_id(record.entity_id)?;
        if self.data.contains_key(&row_id) {
            return Err(StoreError::DuplicateKey(record.entity_id));
        }
        self.data.insert(row_id, Self::to_row(record));
        Ok(())
    }

    /// Overwrites an existing data row.
    pub fn update_record(&mut self, record: &Record) -> StoreResult<()> {
        let row = self
            .data_row_mut(record.entity_id)
            .ok_or(StoreError::MissingRow(record.entity_id))?;
        *row = Self::to_row(record);
        Ok(())
    }

    /// Overwrites an existing data row if its version equals `expected`.
    pub fn update_record_if(
        &mut self,
        record: &Record,
        expected: Option<&VersionToken>,
    ) -> StoreResult<bool> {
        let row = self
            .data_row_mut(record.entity_id)
            .ok_or(StoreError::MissingRow(record.entity_id))?;
        if row.version.as_ref() != expected {
            return Ok(false);
        }
        *row = Self::to_row(record);
        Ok(true)
    }

    /// Returns every stored record, ordered by entity id.
    pub fn records(&self) -> Vec<Record> {
        self.identities
            .keys()
            .filter_map(|id| self.read_record(*id))
            .collect()
    }

    /// Number of identity rows.
    pub fn identity_count(&self) -> usize {
        self.identities.len()
    }

    /// Number of data rows.
    pub fn record_count(&self) -> usize {
        self.data.len()
    }

    fn row_id(&self, entity_id: EntityId) -> StoreResult<RowId> {
        self.identities
            .get(&entity_id)
            .copied()
            .ok_or(StoreError::MissingRow(entity_id))
    }

    fn data_row(&self, entity_id: EntityId) -> Option<&DataRow> {
        let row_id = self.identities.get(&entity_id)?;
        self.data.get(row_id)
    }

    fn data_row_mut(&mut self, entity_id: EntityId) -> Option<&mut DataRow> {
        let row_id = self.identities.get(&entity_id)?;
        self.data.get_mut(row_id)
    }

    fn to_row(record: &Record) -> DataRow {
        DataRow {
            version: record.version,
            payload: record.payload.clone(),
            timestamp: record.timestamp,
        }
    }
}
