//! Persistence counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated atomically by flushes and deletes.
#[derive(Debug, Default)]
pub(super) struct FlushCounters {
    /// Completed flush passes that had something to write.
    pub(super) flushes: AtomicU64,
    /// Records the store confirmed as written.
    pub(super) records_written: AtomicU64,
    /// Records the store failed to write (and that were re-queued).
    pub(super) write_failures: AtomicU64,
    /// Dirty ids whose faction was gone by flush time, deleted from the store.
    pub(super) stale_deleted: AtomicU64,
}

impl FlushCounters {
    pub(super) fn record_flush(&self, written: usize, failed: usize) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.records_written
            .fetch_add(written as u64, Ordering::Relaxed);
        self.write_failures
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub(super) fn record_stale_delete(&self) {
        self.stale_deleted.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub factions: usize,
    pub dirty: usize,
    pub flushes: u64,
    pub records_written: u64,
    pub write_failures: u64,
    pub stale_deleted: u64,
}

impl RegistryStats {
    pub(super) fn new(factions: usize, dirty: usize, counters: &FlushCounters) -> Self {
        Self {
            factions,
            dirty,
            flushes: counters.flushes.load(Ordering::Relaxed),
            records_written: counters.records_written.load(Ordering::Relaxed),
            write_failures: counters.write_failures.load(Ordering::Relaxed),
            stale_deleted: counters.stale_deleted.load(Ordering::Relaxed),
        }
    }
}
