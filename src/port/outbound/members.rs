//! Member directory port: player to faction bindings.

use crate::domain::FactionId;

/// Player-binding collaborator consulted when a faction disappears.
pub trait MemberDirectory: Send + Sync {
    /// Drop every player association pointing at `faction`.
    ///
    /// Called synchronously, exactly once, while the faction is deleted.
    /// Returns how many associations were removed.
    fn clear_faction(&self, faction: &FactionId) -> usize;
}
