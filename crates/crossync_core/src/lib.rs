//! # crossync Core
//!
//! Keeps a single mutable per-entity record (for example a player's
//! inventory snapshot) consistent across several server processes that
//! read and write one shared store.
//!
//! This crate provides:
//! - [`Record`], [`EntityId`] and [`VersionToken`]
//! - [`VersionCache`], the in-memory last-known-version map
//! - [`SyncCoordinator`], the conflict-aware update protocol
//! - [`RecordStore`], the store collaborator trait, and [`InMemoryStore`]
//!
//! ## Update Protocol
//!
//! Every update names the version it was computed from. If the coordinator
//! knows a different current version, the update is stale and is rejected
//! rather than allowed to overwrite newer state (a lost update).
//!
//! ## Key Invariants
//!
//! - The cache holds at most one record per entity
//! - Version tokens are compared for equality only
//! - Update/insert sequences for one entity are serialized; different
//!   entities never block each other
//! - The store is the source of truth; a cache miss consults the store

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod cache;
mod config;
mod coordinator;
mod entity;
mod error;
mod store;

pub use cache::VersionCache;
pub use config::CoordinatorConfig;
pub use coordinator::{CoordinatorStats, SyncCoordinator, UpdateOutcome};
pub use entity::{EntityId, Record, Timestamp, VersionToken};
pub use error::{SyncError, SyncResult};
pub use store::{
    DataRow, InMemoryStore, RecordStore, RowId, StoreCounters, StoreError, StoreResult, StoreTable,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
