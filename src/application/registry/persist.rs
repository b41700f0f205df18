//! Loading and flushing.
//!
//! Every operation here holds the registry's flush lock, so the debounce
//! task, the safety timer, deletes and explicit callers never interleave
//! their storage I/O.

use std::collections::HashMap;
use std::mem;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::codec::{self, Decoded};
use super::{Inner, Registry};
use crate::domain::{Faction, FactionId};
use crate::error::{Error, RegistryError, Result};
use crate::port::outbound::StoredRecord;

/// Summary of a load or reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Factions now in memory.
    pub loaded: usize,
    /// Records that could not be decoded and were left out.
    pub skipped: usize,
    /// Records loaded with repairs; they are queued for rewrite.
    pub repaired: usize,
    /// Unflushed dirty marks dropped by the swap.
    pub discarded: usize,
}

impl Registry {
    /// Replace the in-memory factions with the stored ones.
    ///
    /// Malformed records are skipped with a warning. Repairable damage
    /// (missing entry rank, bad warehouse, negative balance) is fixed and
    /// the faction is queued for rewrite. Handles obtained before the load
    /// are detached: their mutators return `false` from then on.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or the registry is
    /// shutting down. The previous factions stay in place in that case.
    pub async fn load_all(&self) -> Result<LoadReport> {
        let report = self.inner.load().await?;
        info!(
            loaded = report.loaded,
            skipped = report.skipped,
            repaired = report.repaired,
            backend = self.inner.store.name(),
            "Factions loaded"
        );
        Ok(report)
    }

    /// Same as [`Registry::load_all`]. Unflushed changes are discarded; call
    /// [`Registry::save_modified`] first to keep them.
    ///
    /// # Errors
    /// See [`Registry::load_all`].
    pub async fn reload(&self) -> Result<LoadReport> {
        let report = self.inner.load().await?;
        if report.discarded > 0 {
            warn!(
                discarded = report.discarded,
                loaded = report.loaded,
                "Reload discarded unflushed faction changes"
            );
        } else {
            info!(loaded = report.loaded, skipped = report.skipped, "Factions reloaded");
        }
        Ok(report)
    }

    /// Write every dirty faction as one batch.
    ///
    /// The dirty set is cleared before any faction is read. Ids whose
    /// faction no longer exists get their stored record deleted. Ids that
    /// fail to write are queued again. Returns the number of records
    /// written.
    pub async fn save_modified(&self) -> usize {
        self.inner.save_modified().await
    }

    /// Write every faction and flush the store.
    ///
    /// # Errors
    /// Returns the store error when the batch fails as a whole, or
    /// [`Error::PartialWrite`] when individual records fail. Failed ids are
    /// queued again either way.
    pub async fn save_all(&self) -> Result<usize> {
        self.inner.save_all().await
    }
}

impl Inner {
    pub(super) async fn load(self: &Arc<Self>) -> Result<LoadReport> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RegistryError::ShuttingDown.into());
        }
        let _flush = self.flush_lock.lock().await;
        let records = self.store.read_all().await?;

        // Detach handles from the previous load before new ones exist.
        {
            let _gate = self.gate.write();
            self.generation.fetch_add(1, Ordering::SeqCst);
        }

        let mut report = LoadReport::default();
        let mut loaded: HashMap<FactionId, Arc<Faction>> = HashMap::with_capacity(records.len());
        let mut repaired = Vec::new();

        for record in records {
            let Decoded { parts, repairs } =
                match codec::decode(&record.key, &record.body, &self.config) {
                    Ok(decoded) => decoded,
                    Err(e) => {
                        warn!(key = %record.key, error = %e, "Skipping malformed faction record");
                        report.skipped += 1;
                        continue;
                    }
                };

            let id = parts.id.clone();
            if loaded.contains_key(&id) {
                warn!(key = %record.key, faction = %id, "Skipping duplicate faction record");
                report.skipped += 1;
                continue;
            }
            if !repairs.is_empty() {
                warn!(faction = %id, repairs = ?repairs, "Repaired faction record");
                repaired.push(id.clone());
            }
            loaded.insert(id, Arc::new(self.attach(parts)));
        }

        report.loaded = loaded.len();
        report.repaired = repaired.len();
        *self.factions.write() = loaded;

        report.discarded = {
            let mut modified = self.modified.lock();
            let discarded = modified.len();
            modified.clear();
            modified.extend(repaired);
            discarded
        };

        if report.repaired > 0 && !self.flush_scheduled.swap(true, Ordering::SeqCst) {
            self.scheduler.arm();
        }
        Ok(report)
    }

    pub(super) async fn save_modified(&self) -> usize {
        let _flush = self.flush_lock.lock().await;

        let pending = mem::take(&mut *self.modified.lock());
        if pending.is_empty() {
            return 0;
        }

        let mut present = Vec::with_capacity(pending.len());
        let mut stale = Vec::new();
        {
            let factions = self.factions.read();
            for id in pending {
                match factions.get(&id) {
                    Some(faction) => present.push(Arc::clone(faction)),
                    None => stale.push(id),
                }
            }
        }

        let mut failed = Vec::new();
        let records = self.encode_all(&present, &mut failed);
        let batch_size = records.len();

        let mut written = 0;
        if !records.is_empty() {
            let keys: Vec<FactionId> = records.iter().map(|r| FactionId::new(&r.key)).collect();
            match self.store.write_batch(records).await {
                Ok(outcome) => {
                    written = outcome.written.len();
                    for (key, e) in outcome.failed {
                        warn!(faction = %key, error = %e, "Faction write failed, re-queued");
                        failed.push(FactionId::new(key));
                    }
                }
                Err(e) => {
                    warn!(error = %e, count = batch_size, "Batch write failed, re-queued");
                    failed.extend(keys);
                }
            }
        }

        for id in stale {
            match self.store.delete(&id).await {
                Ok(existed) => {
                    self.counters.record_stale_delete();
                    debug!(faction = %id, existed, "Deleted stored record of vanished faction");
                }
                Err(e) => {
                    warn!(faction = %id, error = %e, "Stale record delete failed, re-queued");
                    failed.push(id);
                }
            }
        }

        if written > 0 {
            if let Err(e) = self.store.flush().await {
                warn!(error = %e, backend = self.store.name(), "Store flush failed");
            }
        }

        let failures = failed.len();
        self.counters.record_flush(written, failures);
        self.requeue(failed);

        debug!(written, failures, "Flushed modified factions");
        written
    }

    pub(super) async fn save_all(&self) -> Result<usize> {
        let _flush = self.flush_lock.lock().await;

        let pending = mem::take(&mut *self.modified.lock());
        let factions: Vec<Arc<Faction>>;
        let stale: Vec<FactionId>;
        {
            let live = self.factions.read();
            factions = live.values().cloned().collect();
            stale = pending
                .into_iter()
                .filter(|id| !live.contains_key(id))
                .collect();
        }

        let mut failed = Vec::new();
        let records = self.encode_all(&factions, &mut failed);

        let written = match self.store.write_batch(records).await {
            Ok(outcome) => {
                for (key, e) in outcome.failed {
                    warn!(faction = %key, error = %e, "Faction write failed, re-queued");
                    failed.push(FactionId::new(key));
                }
                outcome.written.len()
            }
            Err(e) => {
                error!(error = %e, count = factions.len(), "Full save failed, re-queued every faction");
                self.requeue(factions.iter().map(|f| f.id().clone()).chain(stale));
                self.counters.record_flush(0, factions.len());
                return Err(e);
            }
        };

        for id in stale {
            match self.store.delete(&id).await {
                Ok(_) => self.counters.record_stale_delete(),
                Err(e) => {
                    warn!(faction = %id, error = %e, "Stale record delete failed, re-queued");
                    failed.push(id);
                }
            }
        }

        if let Err(e) = self.store.flush().await {
            error!(error = %e, backend = self.store.name(), "Store flush failed after full save");
            self.requeue(factions.iter().map(|f| f.id().clone()).chain(failed));
            return Err(e);
        }

        let failures = failed.len();
        self.counters.record_flush(written, failures);
        if failures > 0 {
            self.requeue(failed);
            return Err(Error::PartialWrite { failed: failures });
        }

        info!(written, backend = self.store.name(), "Saved all factions");
        Ok(written)
    }

    /// Encode snapshots of `factions`; ids that fail to encode go to `failed`.
    fn encode_all(&self, factions: &[Arc<Faction>], failed: &mut Vec<FactionId>) -> Vec<StoredRecord> {
        let mut records = Vec::with_capacity(factions.len());
        for faction in factions {
            match codec::encode(&faction.snapshot()) {
                Ok(body) => records.push(StoredRecord::new(faction.id().as_str(), body)),
                Err(e) => {
                    error!(faction = %faction.id(), error = %e, "Failed to encode faction");
                    failed.push(faction.id().clone());
                }
            }
        }
        records
    }
}
