//! Composition root: turns configuration into a wired registry.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
use crate::adapter::outbound::{DirectoryStore, MemberIndex, MemoryStore, SqliteStore};
use crate::application::registry::Registry;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::config::store::StoreConfig;
use crate::port::outbound::{FactionStore, MemberDirectory};

/// Open the configured storage backend.
///
/// SQLite databases are migrated before use; directory stores create their
/// directory.
///
/// # Errors
/// Returns an error if the backend cannot be opened.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn FactionStore>> {
    let store: Arc<dyn FactionStore> = match config {
        StoreConfig::Memory => Arc::new(MemoryStore::new()),
        StoreConfig::Sqlite { path } => {
            let pool = create_pool(path)?;
            run_migrations(&pool)?;
            info!(path = %path, "SQLite store ready");
            Arc::new(SqliteStore::new(pool))
        }
        StoreConfig::Directory { path } => {
            let store = DirectoryStore::open(path)?;
            info!(path = %path.display(), "Directory store ready");
            Arc::new(store)
        }
    };
    Ok(store)
}

/// Components produced by [`build`].
pub struct Runtime {
    pub registry: Registry,
    pub members: Arc<MemberIndex>,
}

/// Open the store and build an (unloaded, unstarted) registry.
///
/// # Errors
/// Returns an error if the store cannot be opened.
pub fn build(config: &Config) -> Result<Runtime> {
    let store = open_store(&config.store)?;
    let members = Arc::new(MemberIndex::new());
    let directory: Arc<dyn MemberDirectory> = members.clone();
    let registry = Registry::new(config.registry.clone(), store, directory);
    Ok(Runtime { registry, members })
}
