//! Coordinator statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of coordinator counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Updates accepted and written to the store.
    pub accepted: u64,
    /// Updates rejected by the cache version check.
    pub rejected: u64,
    /// Updates rejected by the store-side version check.
    pub store_conflicts: u64,
    /// Submissions that failed because the store was unreachable.
    pub store_failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct AtomicStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
    store_conflicts: AtomicU64,
    store_failures: AtomicU64,
}

impl AtomicStats {
    pub(crate) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store_conflict(&self) {
        self.store_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CoordinatorStats {
        CoordinatorStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            store_conflicts: self.store_conflicts.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}
