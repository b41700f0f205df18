//! Canonical test configurations.

use crate::application::registry::RegistryConfig;

/// Registry config with a short debounce and a safety flush that never
/// fires during a test.
pub fn fast_registry() -> RegistryConfig {
    RegistryConfig {
        debounce_ms: 40,
        safety_flush_secs: 3_600,
        default_warehouse_size: 9,
        ..RegistryConfig::default()
    }
}

/// Registry config whose safety flush fires every second.
pub fn safety_net_registry() -> RegistryConfig {
    RegistryConfig {
        debounce_ms: 40,
        safety_flush_secs: 1,
        default_warehouse_size: 9,
        ..RegistryConfig::default()
    }
}
