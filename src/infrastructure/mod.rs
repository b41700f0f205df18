//! Infrastructure layer.
//!
//! Technical concerns that support the registry without containing business
//! logic: configuration loading and wiring of the configured backend.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation

pub mod bootstrap;
pub mod config;
