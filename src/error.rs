use thiserror::Error;

use crate::domain::FactionId;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

/// Routine registry outcomes reported back to callers.
///
/// These are business results, not faults: nothing in the registry is left
/// inconsistent when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("faction '{0}' already exists")]
    DuplicateId(FactionId),

    #[error("invalid faction id '{0}': use lowercase letters, digits, '_' or '-'")]
    InvalidId(String),

    #[error("unknown faction '{0}'")]
    UnknownFaction(FactionId),

    #[error("registry is shutting down")]
    ShuttingDown,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{failed} faction record(s) could not be written")]
    PartialWrite { failed: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
