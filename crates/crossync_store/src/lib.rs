//! # crossync Store
//!
//! Durable [`RecordStore`](crossync_core::RecordStore) implementations.
//!
//! ## Available Stores
//!
//! - [`FileStore`] - A directory shared by every process that synchronizes
//!   the same entities. Operations are serialized across processes by an
//!   advisory lock, which gives the store the uniqueness and
//!   compare-and-swap guarantees the coordinator relies on.
//!
//! ## Example
//!
//! ```rust,no_run
//! use crossync_core::{EntityId, SyncCoordinator};
//! use crossync_store::FileStore;
//! use std::sync::Arc;
//!
//! let store = FileStore::open("data/players", true).unwrap();
//! let coordinator = SyncCoordinator::with_store(Arc::new(store));
//! coordinator.ensure_exists(EntityId::new()).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod file;

pub use file::{FileStore, FORMAT_VERSION};
