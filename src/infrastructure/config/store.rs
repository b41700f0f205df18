//! Storage backend selection.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Which backend holds faction records.
///
/// Selected by the `backend` key of the `[store]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// In-process map. Nothing survives a restart.
    Memory,
    /// SQLite database file.
    Sqlite {
        #[serde(default = "default_sqlite_path")]
        path: String,
    },
    /// One JSON file per faction inside `path`.
    Directory {
        #[serde(default = "default_directory_path")]
        path: PathBuf,
    },
}

fn default_sqlite_path() -> String {
    "factionkeep.db".to_string()
}

fn default_directory_path() -> PathBuf {
    PathBuf::from("factions")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

impl StoreConfig {
    /// Short backend name, matching [`FactionStore::name`].
    ///
    /// [`FactionStore::name`]: crate::port::outbound::FactionStore::name
    #[must_use]
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite { .. } => "sqlite",
            Self::Directory { .. } => "directory",
        }
    }

    pub(super) fn validate(&self) -> Result<()> {
        match self {
            Self::Memory => Ok(()),
            Self::Sqlite { path } if path.trim().is_empty() => Err(ConfigError::MissingField {
                field: "store.path",
            }
            .into()),
            Self::Directory { path } if path.as_os_str().is_empty() => {
                Err(ConfigError::MissingField {
                    field: "store.path",
                }
                .into())
            }
            _ => Ok(()),
        }
    }
}
