//! Rank value: one tier of a faction hierarchy.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use super::id::RankId;
use super::money::{non_negative, Money};

/// Construction input for a [`Rank`].
///
/// Every field that may be absent has an explicit default, so building a
/// rank never depends on null checks at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankSpec {
    pub id: RankId,
    pub default_name: String,
    /// Defaults to `default_name` when absent or blank.
    pub display_name: Option<String>,
    /// Negative values clamp to zero.
    pub salary: Money,
    pub permissions: Vec<String>,
}

impl RankSpec {
    /// Spec with no salary, no permissions and the default display name.
    pub fn new(id: u32, default_name: impl Into<String>) -> Self {
        Self {
            id: RankId::new(id),
            default_name: default_name.into(),
            display_name: None,
            salary: Decimal::ZERO,
            permissions: Vec::new(),
        }
    }

    #[must_use]
    pub fn salary(mut self, salary: Money) -> Self {
        self.salary = salary;
        self
    }

    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }
}

/// One tier inside a faction: pay grade, permission set and display name.
///
/// Ranks compare by value across all fields; inside a faction they are keyed
/// by [`Rank::id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rank {
    id: RankId,
    default_name: String,
    display_name: String,
    salary: Money,
    permissions: BTreeSet<String>,
}

impl Rank {
    /// Build a rank with its invariants normalized.
    #[must_use]
    pub fn new(spec: RankSpec) -> Self {
        let default_name = spec.default_name.trim().to_string();
        let display_name = spec
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default_name.clone());

        Self {
            id: spec.id,
            default_name,
            display_name,
            salary: non_negative(spec.salary),
            permissions: spec
                .permissions
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn id(&self) -> RankId {
        self.id
    }

    #[must_use]
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// True when the display name was changed away from the default.
    #[must_use]
    pub fn has_custom_display_name(&self) -> bool {
        self.display_name != self.default_name
    }

    #[must_use]
    pub fn salary(&self) -> Money {
        self.salary
    }

    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Set the display name. Blank input resets to the default name.
    pub fn set_display_name(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            self.reset_display_name();
        } else {
            self.display_name = name.to_string();
        }
    }

    /// Restore the display name to the default name.
    pub fn reset_display_name(&mut self) {
        self.display_name.clone_from(&self.default_name);
    }

    /// Set the salary, clamping negative amounts to zero.
    pub fn set_salary(&mut self, salary: Money) {
        self.salary = non_negative(salary);
    }

    /// Add a permission token. Returns `false` if it was already granted.
    pub fn grant(&mut self, permission: &str) -> bool {
        let permission = permission.trim();
        if permission.is_empty() {
            return false;
        }
        self.permissions.insert(permission.to_string())
    }

    /// Remove a permission token. Returns `false` if it was not granted.
    pub fn revoke(&mut self, permission: &str) -> bool {
        self.permissions.remove(permission.trim())
    }
}
