//! SQLite persistence adapter.
//!
//! Provides a SQLite-backed [`FactionStore`](crate::port::outbound::store::FactionStore)
//! using Diesel ORM with an r2d2 connection pool.

pub mod database;
pub mod store;

pub use store::SqliteStore;
