//! In-memory store implementation.
//!
//! Backs the `memory` store configuration and most tests. Batches are
//! applied under one write lock, so they are atomic.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::FactionId;
use crate::error::Result;
use crate::port::outbound::store::{BatchOutcome, FactionStore, StoredRecord};

/// In-memory faction store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records.
    pub fn with_records(records: impl IntoIterator<Item = StoredRecord>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write();
            for record in records {
                map.insert(record.key, record.body);
            }
        }
        store
    }

    /// Body stored under `key`, if any.
    #[must_use]
    pub fn body(&self, key: &str) -> Option<String> {
        self.records.read().get(key).cloned()
    }

    /// Stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.records.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl FactionStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read_all(&self) -> Result<Vec<StoredRecord>> {
        Ok(self
            .records
            .read()
            .iter()
            .map(|(key, body)| StoredRecord::new(key.clone(), body.clone()))
            .collect())
    }

    async fn write_batch(&self, records: Vec<StoredRecord>) -> Result<BatchOutcome> {
        let mut map = self.records.write();
        let keys = records.iter().map(|r| r.key.clone()).collect();
        for record in records {
            map.insert(record.key, record.body);
        }
        Ok(BatchOutcome::all_written(keys))
    }

    async fn delete(&self, id: &FactionId) -> Result<bool> {
        Ok(self.records.write().remove(id.as_str()).is_some())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
