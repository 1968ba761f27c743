//! The durable store collaborator.
//!
//! Coordinators consume the store only through [`RecordStore`]. The
//! [`StoreTable`] model is shared by the bundled implementations so they
//! agree on uniqueness and compare-and-swap semantics.

mod backend;
mod error;
mod memory;
mod table;

pub use backend::RecordStore;
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryStore, StoreCounters};
pub use table::{DataRow, RowId, StoreTable};
