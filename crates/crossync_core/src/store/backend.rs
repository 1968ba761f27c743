//! Store collaborator trait definition.

use super::error::StoreResult;
use crate::entity::{EntityId, Record, VersionToken};

/// The durable backing store shared by every coordinator.
///
/// A store persists two related rows per entity: an identity row created by
/// [`insert_row`](Self::insert_row) and a data row holding the latest
/// [`Record`]. The store is the source of truth; coordinators only cache.
///
/// # Invariants
///
/// - At most one identity row and one data row exist per [`EntityId`]
/// - Uniqueness is enforced by the store, so concurrent inserts from several
///   processes fail with `DuplicateKey` rather than creating duplicates
/// - Every operation fails with `Unavailable` on connectivity errors
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing and single-process deployments
/// - `crossync_store::FileStore` - Durable, shared between processes
pub trait RecordStore: Send + Sync {
    /// Returns whether an identity row exists for the entity.
    fn row_exists(&self, entity_id: EntityId) -> StoreResult<bool>;

    /// Creates an identity-only row.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the row already exists.
    fn insert_row(&self, entity_id: EntityId) -> StoreResult<()>;

    /// Reads the stored record, if a data row exists.
    fn read_record(&self, entity_id: EntityId) -> StoreResult<Option<Record>>;

    /// Returns whether a data row exists for the entity.
    fn record_exists(&self, entity_id: EntityId) -> StoreResult<bool>;

    /// Inserts the data row for `record.entity_id`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if a data row already exists and `MissingRow`
    /// if the entity has no identity row.
    fn insert_record(&self, record: &Record) -> StoreResult<()>;

    /// Overwrites every mutable field of the data row.
    ///
    /// # Errors
    ///
    /// Returns `MissingRow` if there is no data row. Calling this on a
    /// missing row is a caller error.
    fn update_record(&self, record: &Record) -> StoreResult<()>;

    /// Overwrites the data row only if its stored version equals `expected`.
    ///
    /// Returns `Ok(false)` without writing when the versions differ.
    ///
    /// # Errors
    ///
    /// Returns `MissingRow` if there is no data row.
    fn update_record_if(
        &self,
        record: &Record,
        expected: Option<&VersionToken>,
    ) -> StoreResult<bool>;
}
