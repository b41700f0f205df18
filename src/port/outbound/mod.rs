//! Outbound ports: what the registry needs from the outside world.

pub mod members;
pub mod store;

pub use members::MemberDirectory;
pub use store::{BatchOutcome, FactionStore, StoredRecord};
