//! Outbound adapters: faction stores and the member index.

pub mod directory;
pub mod members;
pub mod memory;
pub mod sqlite;

pub use directory::DirectoryStore;
pub use members::MemberIndex;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
