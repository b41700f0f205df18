//! In-memory player to faction bindings.

use dashmap::DashMap;
use tracing::debug;

use crate::domain::FactionId;
use crate::port::outbound::members::MemberDirectory;

/// Concurrent player -> faction index.
///
/// A player belongs to at most one faction. Player keys are compared
/// case-sensitively as given by the host (usually a UUID string).
#[derive(Debug, Default)]
pub struct MemberIndex {
    bindings: DashMap<String, FactionId>,
}

impl MemberIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a player to a faction, returning the previous faction if any.
    pub fn bind(&self, player: impl Into<String>, faction: FactionId) -> Option<FactionId> {
        self.bindings.insert(player.into(), faction)
    }

    /// Remove a player's binding.
    pub fn unbind(&self, player: &str) -> Option<FactionId> {
        self.bindings.remove(player).map(|(_, faction)| faction)
    }

    #[must_use]
    pub fn faction_of(&self, player: &str) -> Option<FactionId> {
        self.bindings.get(player).map(|entry| entry.value().clone())
    }

    /// Players bound to `faction`, sorted.
    #[must_use]
    pub fn members_of(&self, faction: &FactionId) -> Vec<String> {
        let mut members: Vec<String> = self
            .bindings
            .iter()
            .filter(|entry| entry.value() == faction)
            .map(|entry| entry.key().clone())
            .collect();
        members.sort();
        members
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl MemberDirectory for MemberIndex {
    fn clear_faction(&self, faction: &FactionId) -> usize {
        let mut cleared = 0;
        self.bindings.retain(|_, bound| {
            let keep = *bound != *faction;
            if !keep {
                cleared += 1;
            }
            keep
        });
        debug!(faction = %faction, cleared, "Cleared faction members");
        cleared
    }
}
