//! Member directory double.

use parking_lot::Mutex;

use crate::adapter::outbound::MemberIndex;
use crate::domain::FactionId;
use crate::port::outbound::MemberDirectory;

/// Member index that also records every `clear_faction` call.
#[derive(Debug, Default)]
pub struct RecordingMembers {
    index: MemberIndex,
    cleared: Mutex<Vec<FactionId>>,
}

impl RecordingMembers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `count` players named `<faction>-player-<n>` to `faction`.
    pub fn bind_players(&self, faction: &str, count: usize) {
        for n in 0..count {
            self.index
                .bind(format!("{faction}-player-{n}"), FactionId::new(faction));
        }
    }

    pub fn index(&self) -> &MemberIndex {
        &self.index
    }

    /// Every faction passed to `clear_faction`, in call order.
    pub fn clear_calls(&self) -> Vec<FactionId> {
        self.cleared.lock().clone()
    }
}

impl MemberDirectory for RecordingMembers {
    fn clear_faction(&self, faction: &FactionId) -> usize {
        self.cleared.lock().push(faction.clone());
        self.index.clear_faction(faction)
    }
}
