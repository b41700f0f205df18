//! Application services (use cases).
//!
//! The registry owns every faction and coordinates the storage and member
//! adapters to persist and clean up after them.

pub mod registry;

pub use registry::{LoadReport, NewFaction, Registry, RegistryConfig, RegistryStats};
