//! Registry tuning and faction defaults.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Permissions granted to the leader rank of a newly created faction.
pub const DEFAULT_LEADER_PERMISSIONS: &[&str] = &[
    "faction.chat",
    "faction.invite",
    "faction.kick",
    "faction.promote",
    "faction.demote",
    "faction.ranks.edit",
    "faction.treasury.deposit",
    "faction.treasury.withdraw",
    "faction.warehouse.open",
    "faction.warehouse.edit",
];

/// Configuration for the faction registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Quiet period after the first change before a flush runs.
    pub debounce_ms: u64,
    /// Interval of the periodic safety flush.
    pub safety_flush_secs: u64,
    /// Warehouse size used when none is given (or a stored one is invalid).
    pub default_warehouse_size: usize,
    /// Id of the leader rank created with every faction. Must be above 1.
    pub leader_rank_id: u32,
    /// Default name of rank 1.
    pub entry_rank_name: String,
    /// Default name of the leader rank.
    pub leader_rank_name: String,
    /// Permissions granted to the leader rank at creation.
    pub leader_permissions: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 3_000,
            safety_flush_secs: 300,
            default_warehouse_size: 27,
            leader_rank_id: 10,
            entry_rank_name: "Recruit".into(),
            leader_rank_name: "Leader".into(),
            leader_permissions: DEFAULT_LEADER_PERMISSIONS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        }
    }
}

impl RegistryConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn safety_interval(&self) -> Duration {
        Duration::from_secs(self.safety_flush_secs)
    }

    /// Validate field ranges.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &'static str, reason: &str| -> Result<()> {
            Err(ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            }
            .into())
        };

        if self.debounce_ms == 0 {
            return invalid("registry.debounce_ms", "must be greater than 0");
        }
        if self.safety_flush_secs == 0 {
            return invalid("registry.safety_flush_secs", "must be greater than 0");
        }
        if self.default_warehouse_size == 0 {
            return invalid("registry.default_warehouse_size", "must be greater than 0");
        }
        if self.leader_rank_id <= 1 {
            return invalid("registry.leader_rank_id", "must be greater than 1");
        }
        if self.entry_rank_name.trim().is_empty() {
            return invalid("registry.entry_rank_name", "cannot be empty");
        }
        if self.leader_rank_name.trim().is_empty() {
            return invalid("registry.leader_rank_name", "cannot be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn defaults_are_valid() {
        let config = RegistryConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.debounce(), Duration::from_secs(3));
        assert_eq!(config.leader_permissions.len(), DEFAULT_LEADER_PERMISSIONS.len());
    }

    #[test]
    fn leader_rank_must_be_senior_to_entry() {
        let config = RegistryConfig {
            leader_rank_id: 1,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "registry.leader_rank_id",
                ..
            })
        ));
    }

    #[test]
    fn zero_debounce_is_rejected() {
        let config = RegistryConfig {
            debounce_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
