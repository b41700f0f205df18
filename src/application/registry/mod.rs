//! Faction registry: the authoritative in-memory store of factions and the
//! dirty tracking that drives persistence.
//!
//! # Lifecycle of an id
//!
//! ```text
//! ABSENT --create/load--> CLEAN <--mark/flush--> DIRTY
//!                           |                      |
//!                           +-------delete---------+--> ABSENT
//! ```
//!
//! Factions report their own changes through a [`ChangeListener`] installed
//! at construction. The first mark of a debounce window arms the flush task
//! (see [`scheduler`]); every flush snapshots and clears the dirty set before
//! reading faction state, so marks arriving mid-flush land in the next
//! window instead of being lost.

mod codec;
mod config;
mod persist;
mod scheduler;
mod stats;

pub use codec::{decode, encode, Decoded, FactionRecord, RankRecord};
pub use config::{RegistryConfig, DEFAULT_LEADER_PERMISSIONS};
pub use persist::LoadReport;
pub use stats::RegistryStats;

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::{
    empty_slots, ChangeListener, ChangePermit, Faction, FactionId, FactionKind, FactionParts,
    FactionProfile, Money, Rank, RankId, RankSpec,
};
use crate::error::{RegistryError, Result};
use crate::port::outbound::{FactionStore, MemberDirectory};

use scheduler::FlushScheduler;
use stats::FlushCounters;

/// Color given to factions created without one.
pub const DEFAULT_COLOR: &str = "#FFFFFF";

/// Input for [`Registry::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFaction {
    pub id: String,
    pub name: String,
    pub kind: FactionKind,
    pub color: String,
    pub prefix: String,
    pub initial_balance: Money,
    /// `None` (or zero) uses the configured default size.
    pub warehouse_size: Option<usize>,
}

impl NewFaction {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: FactionKind::Other,
            color: DEFAULT_COLOR.to_string(),
            prefix: String::new(),
            initial_balance: Decimal::ZERO,
            warehouse_size: None,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: FactionKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn initial_balance(mut self, amount: Money) -> Self {
        self.initial_balance = amount;
        self
    }

    #[must_use]
    pub fn warehouse_size(mut self, size: usize) -> Self {
        self.warehouse_size = Some(size);
        self
    }
}

/// Shared handle to the faction registry.
///
/// Cloning is cheap; every clone addresses the same registry.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    config: RegistryConfig,
    store: Arc<dyn FactionStore>,
    members: Arc<dyn MemberDirectory>,
    factions: RwLock<HashMap<FactionId, Arc<Faction>>>,
    modified: Mutex<HashSet<FactionId>>,
    /// Set while a debounce window is open.
    flush_scheduled: AtomicBool,
    closed: AtomicBool,
    /// Held for reading by every admitted mutation; shutdown and reload take
    /// it for writing to change what is admitted.
    gate: Arc<RwLock<()>>,
    /// Bumped on every successful mark; tells a finished flush whether
    /// anything arrived while it ran.
    mark_epoch: AtomicU64,
    /// Bumped on every load; faction handles from older loads are detached.
    generation: AtomicU64,
    /// Serializes flushes, deletes and loads.
    flush_lock: tokio::sync::Mutex<()>,
    counters: FlushCounters,
    scheduler: FlushScheduler,
}

/// Listener installed into every faction the registry owns.
struct RegistryListener {
    inner: Weak<Inner>,
    gate: Arc<RwLock<()>>,
    generation: u64,
}

impl ChangeListener for RegistryListener {
    fn admit(&self) -> Option<ChangePermit<'_>> {
        let guard = self.gate.read_recursive();
        let inner = self.inner.upgrade()?;
        if inner.closed.load(Ordering::SeqCst)
            || inner.generation.load(Ordering::SeqCst) != self.generation
        {
            return None;
        }
        Some(ChangePermit::guarded(guard))
    }

    fn faction_changed(&self, id: &FactionId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.mark(id);
        }
    }
}

impl Registry {
    /// Create an empty registry. Call [`Registry::load_all`] to populate it
    /// and [`Registry::start`] to enable debounced flushing.
    pub fn new(
        config: RegistryConfig,
        store: Arc<dyn FactionStore>,
        members: Arc<dyn MemberDirectory>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                members,
                factions: RwLock::new(HashMap::new()),
                modified: Mutex::new(HashSet::new()),
                flush_scheduled: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                gate: Arc::new(RwLock::new(())),
                mark_epoch: AtomicU64::new(0),
                generation: AtomicU64::new(0),
                flush_lock: tokio::sync::Mutex::new(()),
                counters: FlushCounters::default(),
                scheduler: FlushScheduler::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Name of the configured storage backend.
    #[must_use]
    pub fn store_name(&self) -> &'static str {
        self.inner.store.name()
    }

    /// Spawn the flush task on the current tokio runtime.
    ///
    /// Calling it again while the task runs is a no-op.
    ///
    /// # Errors
    /// Returns [`RegistryError::ShuttingDown`] after [`Registry::shutdown`].
    pub fn start(&self) -> std::result::Result<(), RegistryError> {
        if self.is_closed() {
            return Err(RegistryError::ShuttingDown);
        }
        let started = self.inner.scheduler.start(
            Arc::downgrade(&self.inner),
            self.inner.config.debounce(),
            self.inner.config.safety_interval(),
        );
        if started {
            info!(
                debounce_ms = self.inner.config.debounce_ms,
                safety_flush_secs = self.inner.config.safety_flush_secs,
                "Registry flush task started"
            );
        } else {
            debug!("Registry flush task already started");
        }
        Ok(())
    }

    /// Stop accepting changes, stop the flush task and write every faction.
    ///
    /// Mutations already admitted finish (and are marked) before the
    /// registry closes, so the final save includes them. Safe to call more
    /// than once; later calls return `Ok(0)`.
    ///
    /// # Errors
    /// Returns an error if the final save could not write every faction.
    pub async fn shutdown(&self) -> Result<usize> {
        let already_closed = {
            let _gate = self.inner.gate.write();
            self.inner.closed.swap(true, Ordering::SeqCst)
        };
        if already_closed {
            return Ok(0);
        }
        info!("Registry shutting down");
        self.inner.scheduler.stop().await;

        let written = self.save_all().await?;
        info!(written, "Registry shutdown complete");
        Ok(written)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Whether the flush task is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.scheduler.is_running()
    }

    // ---------------------------------------------------------------------
    // Create / delete
    // ---------------------------------------------------------------------

    /// Create a faction with an entry rank and a leader rank, and mark it
    /// dirty.
    ///
    /// # Errors
    /// - [`RegistryError::ShuttingDown`] after shutdown
    /// - [`RegistryError::InvalidId`] for an unusable id
    /// - [`RegistryError::DuplicateId`] if the id exists (case-insensitively)
    pub fn create(&self, new: NewFaction) -> std::result::Result<Arc<Faction>, RegistryError> {
        let _gate = self.inner.gate.read_recursive();
        if self.is_closed() {
            return Err(RegistryError::ShuttingDown);
        }
        let id = FactionId::new(&new.id);
        if !id.is_valid() {
            return Err(RegistryError::InvalidId(new.id));
        }

        let config = &self.inner.config;
        // Rank 1 is the entry rank; the leader must sit above it.
        let leader_rank_id = config.leader_rank_id.max(RankId::ENTRY.get() + 1);
        let warehouse_size = new
            .warehouse_size
            .filter(|size| *size > 0)
            .unwrap_or(config.default_warehouse_size);

        let parts = FactionParts {
            id: id.clone(),
            profile: FactionProfile {
                name: new.name,
                kind: new.kind,
                color: new.color,
                prefix: new.prefix,
            },
            balance: new.initial_balance,
            ranks: vec![
                Rank::new(RankSpec::new(1, config.entry_rank_name.clone())),
                Rank::new(
                    RankSpec::new(leader_rank_id, config.leader_rank_name.clone())
                        .permissions(config.leader_permissions.iter().cloned()),
                ),
            ],
            warehouse_size,
            warehouse: empty_slots(warehouse_size),
        };

        let faction = {
            let mut factions = self.inner.factions.write();
            match factions.entry(id.clone()) {
                Entry::Occupied(_) => return Err(RegistryError::DuplicateId(id)),
                Entry::Vacant(slot) => {
                    let faction = Arc::new(self.inner.attach(parts));
                    slot.insert(Arc::clone(&faction));
                    faction
                }
            }
        };

        self.inner.mark(&id);
        info!(faction = %id, name = %faction.name(), kind = %faction.kind(), "Faction created");
        Ok(faction)
    }

    /// Delete a faction from memory and storage.
    ///
    /// Player bindings are cleared through the member directory, and the
    /// stored record is deleted immediately rather than on the next flush.
    /// If the storage delete fails, the id stays queued so the next flush
    /// retries it. Returns the number of player bindings cleared.
    ///
    /// # Errors
    /// - [`RegistryError::ShuttingDown`] after shutdown
    /// - [`RegistryError::UnknownFaction`] if no such faction exists
    pub async fn delete(&self, id: &str) -> std::result::Result<usize, RegistryError> {
        let id = FactionId::new(id);
        let _flush = self.inner.flush_lock.lock().await;
        // Checked under the flush lock: the final save cannot have run yet.
        if self.is_closed() {
            return Err(RegistryError::ShuttingDown);
        }

        let Some(faction) = self.inner.factions.write().remove(&id) else {
            warn!(faction = %id, "Delete requested for unknown faction");
            return Err(RegistryError::UnknownFaction(id));
        };
        let cleared = self.inner.members.clear_faction(&id);
        self.inner.modified.lock().remove(&id);

        match self.inner.store.delete(&id).await {
            Ok(existed) => {
                info!(faction = %id, name = %faction.name(), cleared, existed, "Faction deleted");
            }
            Err(e) => {
                warn!(faction = %id, error = %e, "Failed to delete stored faction, will retry on next flush");
                self.inner.requeue([id]);
            }
        }
        Ok(cleared)
    }

    // ---------------------------------------------------------------------
    // Dirty tracking
    // ---------------------------------------------------------------------

    /// Mark a faction dirty so the next flush writes it.
    ///
    /// Idempotent. Unknown ids (and any id after shutdown) are ignored and
    /// return `false`.
    pub fn mark_modified(&self, id: &str) -> bool {
        let _gate = self.inner.gate.read_recursive();
        self.inner.mark(&FactionId::new(id))
    }

    #[must_use]
    pub fn is_modified(&self, id: &str) -> bool {
        self.inner.modified.lock().contains(&FactionId::new(id))
    }

    /// Ids waiting for a flush, sorted.
    #[must_use]
    pub fn modified_ids(&self) -> Vec<FactionId> {
        let mut ids: Vec<FactionId> = self.inner.modified.lock().iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Whether a debounce window is open.
    #[must_use]
    pub fn flush_pending(&self) -> bool {
        self.inner.flush_scheduled.load(Ordering::SeqCst)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Faction>> {
        self.inner.factions.read().get(&FactionId::new(id)).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.inner.factions.read().contains_key(&FactionId::new(id))
    }

    /// All faction ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<FactionId> {
        let mut ids: Vec<FactionId> = self.inner.factions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All factions, sorted by id.
    #[must_use]
    pub fn factions(&self) -> Vec<Arc<Faction>> {
        let mut factions: Vec<Arc<Faction>> =
            self.inner.factions.read().values().cloned().collect();
        factions.sort_by(|a, b| a.id().cmp(b.id()));
        factions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.factions.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.factions.read().is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats::new(
            self.len(),
            self.inner.modified.lock().len(),
            &self.inner.counters,
        )
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("store", &self.inner.store.name())
            .field("factions", &self.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Build a faction wired to this registry's current generation.
    fn attach(self: &Arc<Self>, parts: FactionParts) -> Faction {
        let listener = RegistryListener {
            inner: Arc::downgrade(self),
            gate: Arc::clone(&self.gate),
            generation: self.generation.load(Ordering::SeqCst),
        };
        Faction::from_parts(parts).with_listener(Arc::new(listener))
    }

    fn mark(&self, id: &FactionId) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            debug!(faction = %id, "Ignoring mark after shutdown");
            return false;
        }
        if !self.factions.read().contains_key(id) {
            warn!(faction = %id, "Ignoring mark for unknown faction");
            return false;
        }

        self.modified.lock().insert(id.clone());
        self.mark_epoch.fetch_add(1, Ordering::SeqCst);
        if !self.flush_scheduled.swap(true, Ordering::SeqCst) {
            self.scheduler.arm();
        }
        true
    }

    /// Put ids back into the dirty set without opening a debounce window.
    fn requeue(&self, ids: impl IntoIterator<Item = FactionId>) {
        self.modified.lock().extend(ids);
    }

    /// Flush run by the debounce timer.
    async fn debounced_flush(&self) {
        let epoch = self.mark_epoch.load(Ordering::SeqCst);
        self.save_modified().await;
        self.flush_scheduled.store(false, Ordering::SeqCst);

        let marked_during_flush = self.mark_epoch.load(Ordering::SeqCst) != epoch;
        if marked_during_flush
            && !self.modified.lock().is_empty()
            && !self.flush_scheduled.swap(true, Ordering::SeqCst)
        {
            debug!("Changes arrived during flush, opening a new window");
            self.scheduler.arm();
        }
    }
}
