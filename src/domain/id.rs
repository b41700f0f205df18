//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Faction identifier - lowercase newtype used as the storage key.
///
/// The inner String is private to ensure all construction goes through
/// [`FactionId::new`], which normalizes case and surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FactionId(String);

impl FactionId {
    /// Create a new `FactionId`, lowercasing and trimming the input.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    /// Get the faction ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the normalized id is usable as a storage key.
    ///
    /// Keys are non-empty and limited to `[a-z0-9_-]` so every backend can
    /// use them verbatim (file names, primary keys).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FactionId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for FactionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<FactionId> for String {
    fn from(id: FactionId) -> Self {
        id.0
    }
}

/// Rank identifier inside one faction. Higher is more senior.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RankId(u32);

impl RankId {
    /// The entry rank every faction must carry.
    pub const ENTRY: RankId = RankId(1);

    /// Create a new `RankId`.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RankId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
