//! Store port for faction persistence.
//!
//! The registry treats storage as an opaque key-value backend: keys are
//! faction ids, values are encoded record bodies. Decoding, validation and
//! repair happen in the registry, so a backend never has to understand the
//! record shape.

use async_trait::async_trait;

use crate::domain::FactionId;
use crate::error::{Error, Result};

/// One persisted faction record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Storage key (the faction id as stored).
    pub key: String,
    /// Encoded record body.
    pub body: String,
}

impl StoredRecord {
    pub fn new(key: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            body: body.into(),
        }
    }
}

/// Result of a batch write.
///
/// Backends that commit a batch atomically either return `Err` for the whole
/// call or an outcome with no failures. Backends that write record by record
/// list the keys that did not make it.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Keys durably written.
    pub written: Vec<String>,
    /// Keys that failed, with the reason.
    pub failed: Vec<(String, Error)>,
}

impl BatchOutcome {
    /// Outcome for a batch that was committed in full.
    #[must_use]
    pub fn all_written(keys: Vec<String>) -> Self {
        Self {
            written: keys,
            failed: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Durable storage for faction records.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - Every method is independently retryable
/// - Only the registry's persistence step calls these methods
#[async_trait]
pub trait FactionStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Read every stored record.
    async fn read_all(&self) -> Result<Vec<StoredRecord>>;

    /// Write a batch of records, replacing existing keys.
    async fn write_batch(&self, records: Vec<StoredRecord>) -> Result<BatchOutcome>;

    /// Delete one record. Returns true if it existed.
    async fn delete(&self, id: &FactionId) -> Result<bool>;

    /// Make previous writes durable.
    async fn flush(&self) -> Result<()>;
}
