//! Core domain types: identifiers, money, ranks, factions.
//!
//! Nothing in this module performs I/O. The aggregate reports its changes
//! through [`ChangeListener`]; persistence lives in the application layer.

pub mod faction;
pub mod id;
pub mod item;
pub mod money;
pub mod rank;

pub use faction::{
    ChangeListener, ChangePermit, Faction, FactionKind, FactionParts, FactionProfile,
    DEFAULT_ENTRY_RANK_NAME,
};
pub use id::{FactionId, RankId};
pub use item::{empty_slots, ItemStack, Slots};
pub use money::Money;
pub use rank::{Rank, RankSpec};
