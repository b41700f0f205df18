//! Faction aggregate: treasury, rank table and warehouse.
//!
//! A [`Faction`] is shared behind an `Arc` by the registry and mutated in
//! place from any thread. Each concern sits behind its own lock, so every
//! operation is atomic with respect to its own invariant:
//!
//! - `balance >= 0` (checked and updated under one lock in [`Faction::withdraw`])
//! - rank 1 always exists
//! - the warehouse always holds exactly `warehouse_size` slots
//!
//! State changes are reported to an injected [`ChangeListener`] after the
//! lock is released; the listener is how the registry learns a faction is
//! dirty. Every mutation first obtains a [`ChangePermit`] from the listener
//! and keeps it until the change has been reported.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::id::{FactionId, RankId};
use super::item::{empty_slots, ItemStack, Slots};
use super::money::{non_negative, Money};
use super::rank::{Rank, RankSpec};

/// Name given to a synthesized entry rank.
pub const DEFAULT_ENTRY_RANK_NAME: &str = "Member";

/// Organization category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactionKind {
    State,
    Criminal,
    #[default]
    Other,
}

impl FactionKind {
    /// Stable name used in storage and command output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::State => "STATE",
            Self::Criminal => "CRIMINAL",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for FactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STATE" => Ok(Self::State),
            "CRIMINAL" => Ok(Self::Criminal),
            "OTHER" => Ok(Self::Other),
            other => Err(format!("unknown faction type '{other}'")),
        }
    }
}

/// Display metadata of a faction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactionProfile {
    pub name: String,
    pub kind: FactionKind,
    /// Hex color, e.g. `#1E90FF`.
    pub color: String,
    pub prefix: String,
}

/// Admission of one mutation.
///
/// Held from the admission check until the change has been applied and
/// reported, so whoever closes the gate waits for in-flight mutations.
#[must_use]
pub struct ChangePermit<'a> {
    _guard: Option<RwLockReadGuard<'a, ()>>,
}

impl<'a> ChangePermit<'a> {
    /// Permit that does not hold any gate.
    pub fn open() -> Self {
        Self { _guard: None }
    }

    /// Permit that keeps `guard` for its lifetime.
    pub fn guarded(guard: RwLockReadGuard<'a, ()>) -> Self {
        Self {
            _guard: Some(guard),
        }
    }
}

/// Receives change notifications from factions.
///
/// Implemented by the registry; injected at construction so a faction never
/// has to look its owner up.
pub trait ChangeListener: Send + Sync {
    /// Admit one mutation, or `None` once changes are no longer accepted.
    ///
    /// The permit stays alive until [`ChangeListener::faction_changed`] has
    /// returned.
    fn admit(&self) -> Option<ChangePermit<'_>>;

    /// Called after a mutation changed the faction's state.
    fn faction_changed(&self, id: &FactionId);
}

/// Every field of a faction, used both to build one and to snapshot one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactionParts {
    pub id: FactionId,
    pub profile: FactionProfile,
    pub balance: Money,
    pub ranks: Vec<Rank>,
    pub warehouse_size: usize,
    pub warehouse: Slots,
}

/// A player organization owning ranks, a treasury and a warehouse.
pub struct Faction {
    id: FactionId,
    warehouse_size: usize,
    profile: RwLock<FactionProfile>,
    balance: Mutex<Money>,
    ranks: RwLock<BTreeMap<RankId, Rank>>,
    warehouse: RwLock<Slots>,
    listener: Option<Arc<dyn ChangeListener>>,
}

impl Faction {
    /// Build a faction from its parts, normalizing invariants.
    ///
    /// A negative balance clamps to zero, a missing entry rank is
    /// synthesized, and a warehouse whose length disagrees with
    /// `warehouse_size` is replaced by empty slots.
    #[must_use]
    pub fn from_parts(parts: FactionParts) -> Self {
        let warehouse_size = parts.warehouse_size.max(1);

        let mut ranks: BTreeMap<RankId, Rank> =
            parts.ranks.into_iter().map(|r| (r.id(), r)).collect();
        ranks
            .entry(RankId::ENTRY)
            .or_insert_with(|| Rank::new(RankSpec::new(1, DEFAULT_ENTRY_RANK_NAME)));

        let warehouse = if parts.warehouse.len() == warehouse_size {
            parts.warehouse
        } else {
            if !parts.warehouse.is_empty() {
                warn!(
                    faction = %parts.id,
                    expected = warehouse_size,
                    actual = parts.warehouse.len(),
                    "Warehouse size mismatch, starting empty"
                );
            }
            empty_slots(warehouse_size)
        };

        Self {
            id: parts.id,
            warehouse_size,
            profile: RwLock::new(parts.profile),
            balance: Mutex::new(non_negative(parts.balance)),
            ranks: RwLock::new(ranks),
            warehouse: RwLock::new(warehouse),
            listener: None,
        }
    }

    /// Attach the listener notified on every state change.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ChangeListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    fn admit(&self) -> Option<ChangePermit<'_>> {
        match &self.listener {
            Some(listener) => listener.admit(),
            None => Some(ChangePermit::open()),
        }
    }

    fn changed(&self) {
        if let Some(listener) = &self.listener {
            listener.faction_changed(&self.id);
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn id(&self) -> &FactionId {
        &self.id
    }

    #[must_use]
    pub fn profile(&self) -> FactionProfile {
        self.profile.read().clone()
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.profile.read().name.clone()
    }

    #[must_use]
    pub fn kind(&self) -> FactionKind {
        self.profile.read().kind
    }

    #[must_use]
    pub fn color(&self) -> String {
        self.profile.read().color.clone()
    }

    #[must_use]
    pub fn prefix(&self) -> String {
        self.profile.read().prefix.clone()
    }

    #[must_use]
    pub fn balance(&self) -> Money {
        *self.balance.lock()
    }

    #[must_use]
    pub fn warehouse_size(&self) -> usize {
        self.warehouse_size
    }

    /// Copy of the warehouse slots.
    #[must_use]
    pub fn warehouse_contents(&self) -> Slots {
        self.warehouse.read().clone()
    }

    /// All ranks, most junior first.
    #[must_use]
    pub fn ranks(&self) -> Vec<Rank> {
        self.ranks.read().values().cloned().collect()
    }

    #[must_use]
    pub fn rank(&self, id: RankId) -> Option<Rank> {
        self.ranks.read().get(&id).cloned()
    }

    #[must_use]
    pub fn entry_rank(&self) -> Option<Rank> {
        self.rank(RankId::ENTRY)
    }

    /// The most senior rank (highest id).
    #[must_use]
    pub fn leader_rank(&self) -> Option<Rank> {
        self.ranks.read().values().next_back().cloned()
    }

    /// Consistent-per-field copy of the whole faction.
    #[must_use]
    pub fn snapshot(&self) -> FactionParts {
        FactionParts {
            id: self.id.clone(),
            profile: self.profile(),
            balance: self.balance(),
            ranks: self.ranks(),
            warehouse_size: self.warehouse_size,
            warehouse: self.warehouse_contents(),
        }
    }

    // ---------------------------------------------------------------------
    // Profile
    // ---------------------------------------------------------------------

    fn update_profile(&self, apply: impl FnOnce(&mut FactionProfile)) -> bool {
        let Some(_permit) = self.admit() else {
            return false;
        };
        {
            let mut profile = self.profile.write();
            apply(&mut *profile);
        }
        self.changed();
        true
    }

    pub fn set_name(&self, name: impl Into<String>) -> bool {
        let name = name.into();
        self.update_profile(|p| p.name = name)
    }

    pub fn set_kind(&self, kind: FactionKind) -> bool {
        self.update_profile(|p| p.kind = kind)
    }

    pub fn set_color(&self, color: impl Into<String>) -> bool {
        let color = color.into();
        self.update_profile(|p| p.color = color)
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) -> bool {
        let prefix = prefix.into();
        self.update_profile(|p| p.prefix = prefix)
    }

    // ---------------------------------------------------------------------
    // Treasury
    // ---------------------------------------------------------------------

    /// Add funds. Non-positive amounts, and deposits the balance cannot
    /// represent, are ignored and return `false`.
    pub fn deposit(&self, amount: Money) -> bool {
        if amount <= Decimal::ZERO {
            return false;
        }
        let Some(_permit) = self.admit() else {
            return false;
        };
        {
            let mut balance = self.balance.lock();
            match balance.checked_add(amount) {
                Some(total) => *balance = total,
                None => return false,
            }
        }
        self.changed();
        true
    }

    /// Remove funds if the balance covers them.
    ///
    /// Insufficient funds is an expected outcome: the call returns `false`
    /// and the balance is untouched.
    pub fn withdraw(&self, amount: Money) -> bool {
        if amount <= Decimal::ZERO {
            return false;
        }
        let Some(_permit) = self.admit() else {
            return false;
        };
        {
            let mut balance = self.balance.lock();
            if *balance < amount {
                return false;
            }
            *balance -= amount;
        }
        self.changed();
        true
    }

    /// Overwrite the balance, clamping negative amounts to zero.
    pub fn set_balance(&self, amount: Money) -> bool {
        let Some(_permit) = self.admit() else {
            return false;
        };
        *self.balance.lock() = non_negative(amount);
        self.changed();
        true
    }

    // ---------------------------------------------------------------------
    // Ranks
    // ---------------------------------------------------------------------

    /// Insert or replace a rank by id.
    pub fn add_rank(&self, rank: Rank) -> bool {
        let Some(_permit) = self.admit() else {
            return false;
        };
        self.ranks.write().insert(rank.id(), rank);
        self.changed();
        true
    }

    /// Store a modified copy of a rank, replacing the one with the same id.
    ///
    /// Ranks handed out by [`Faction::rank`] are copies; edits only take
    /// effect (and only get persisted) once passed back through here.
    pub fn update_rank(&self, rank: Rank) -> bool {
        self.add_rank(rank)
    }

    /// Remove a rank. The entry rank cannot be removed.
    pub fn remove_rank(&self, id: RankId) -> bool {
        if id == RankId::ENTRY {
            return false;
        }
        let Some(_permit) = self.admit() else {
            return false;
        };
        let removed = self.ranks.write().remove(&id).is_some();
        if removed {
            self.changed();
        }
        removed
    }

    // ---------------------------------------------------------------------
    // Warehouse
    // ---------------------------------------------------------------------

    /// Replace the warehouse contents.
    ///
    /// A sequence whose length differs from the warehouse size is rejected
    /// and the warehouse is reset to empty slots; returns `false` in that
    /// case.
    pub fn set_warehouse_contents(&self, contents: Slots) -> bool {
        let Some(_permit) = self.admit() else {
            return false;
        };
        let applied = contents.len() == self.warehouse_size;
        {
            let mut warehouse = self.warehouse.write();
            if applied {
                *warehouse = contents;
            } else {
                warn!(
                    faction = %self.id,
                    expected = self.warehouse_size,
                    actual = contents.len(),
                    "Rejected warehouse contents of wrong size, resetting warehouse"
                );
                *warehouse = empty_slots(self.warehouse_size);
            }
        }
        self.changed();
        applied
    }

    /// Replace one slot. Out-of-range indexes return `false`.
    pub fn set_warehouse_slot(&self, index: usize, item: Option<ItemStack>) -> bool {
        if index >= self.warehouse_size {
            return false;
        }
        let Some(_permit) = self.admit() else {
            return false;
        };
        self.warehouse.write()[index] = item;
        self.changed();
        true
    }
}

impl fmt::Debug for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Faction")
            .field("id", &self.id)
            .field("profile", &*self.profile.read())
            .field("balance", &self.balance())
            .field("ranks", &self.ranks.read().len())
            .field("warehouse_size", &self.warehouse_size)
            .finish_non_exhaustive()
    }
}
