//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points the registry relies on. They are
//! traits that adapters implement to integrate with external systems.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │       Application       │
//!                    │   (faction registry)    │
//!     ┌──────────────┤    Domain + Port        ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     ▼                                                       ▼
//! ┌──────────────────────┐                      ┌──────────────────────┐
//! │ Store Adapter        │                      │ Member Directory     │
//! │ (memory/sqlite/dir)  │                      │ Adapter              │
//! └──────────────────────┘                      └──────────────────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`FactionStore`](outbound::store::FactionStore) - Durable faction records
//! - [`MemberDirectory`](outbound::members::MemberDirectory) - Player bindings

pub mod outbound;
