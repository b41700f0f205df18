//! Factionkeep - faction registry and persistence engine for role-play
//! game servers.
//!
//! The registry is the authoritative in-memory store of factions: their
//! rank hierarchies, treasuries and warehouses. Mutations mark a faction
//! dirty; a debounced background task collapses bursts of changes into one
//! batch write to the configured store.
//!
//! # Modules
//!
//! - [`domain`] - Identifiers, money, ranks, items and the faction aggregate
//! - [`application`] - The registry, its record codec and flush scheduler
//! - [`port`] - Store and member-directory contracts
//! - [`adapter`] - Memory, SQLite and directory stores; the member index
//! - [`infrastructure`] - Configuration and wiring
//! - [`cli`] - The `factionkeep` operator commands
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use factionkeep::adapter::outbound::{MemberIndex, MemoryStore};
//! use factionkeep::application::{NewFaction, Registry, RegistryConfig};
//! use rust_decimal::Decimal;
//!
//! # async fn demo() -> factionkeep::error::Result<()> {
//! let registry = Registry::new(
//!     RegistryConfig::default(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemberIndex::new()),
//! );
//! registry.load_all().await?;
//! registry.start()?;
//!
//! let pd = registry.create(NewFaction::new("pd", "Police Department"))?;
//! pd.deposit(Decimal::from(500));
//!
//! registry.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
