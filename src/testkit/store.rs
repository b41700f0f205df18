//! Store double with switchable failures.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::adapter::outbound::MemoryStore;
use crate::domain::FactionId;
use crate::error::{Error, Result};
use crate::port::outbound::{BatchOutcome, FactionStore, StoredRecord};

/// Memory store that can be told to fail and remembers every batch.
///
/// - `fail_batches(true)` makes every `write_batch` return `Err`
/// - `fail_key(k)` makes record `k` fail individually (the rest commit)
/// - `fail_deletes(true)` makes every `delete` return `Err`
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_batches: AtomicBool,
    fail_deletes: AtomicBool,
    failing_keys: Mutex<HashSet<String>>,
    batches: Mutex<Vec<Vec<String>>>,
    deletes: Mutex<Vec<String>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = StoredRecord>) -> Self {
        Self {
            inner: MemoryStore::with_records(records),
            ..Self::default()
        }
    }

    pub fn fail_batches(&self, fail: bool) {
        self.fail_batches.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_key(&self, key: &str) {
        self.failing_keys.lock().insert(key.to_string());
    }

    pub fn heal_key(&self, key: &str) {
        self.failing_keys.lock().remove(key);
    }

    /// Keys of every attempted batch, sorted within each batch.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }

    /// Keys of every attempted delete.
    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().clone()
    }

    pub fn body(&self, key: &str) -> Option<String> {
        self.inner.body(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }
}

#[async_trait]
impl FactionStore for FaultyStore {
    fn name(&self) -> &'static str {
        "faulty"
    }

    async fn read_all(&self) -> Result<Vec<StoredRecord>> {
        self.inner.read_all().await
    }

    async fn write_batch(&self, records: Vec<StoredRecord>) -> Result<BatchOutcome> {
        let mut keys: Vec<String> = records.iter().map(|r| r.key.clone()).collect();
        keys.sort();
        self.batches.lock().push(keys);

        if self.fail_batches.load(Ordering::SeqCst) {
            return Err(Error::Database("injected batch failure".into()));
        }

        let failing = self.failing_keys.lock().clone();
        let (bad, good): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|r| failing.contains(&r.key));

        let mut outcome = self.inner.write_batch(good).await?;
        outcome.failed.extend(
            bad.into_iter()
                .map(|r| (r.key, Error::Database("injected record failure".into()))),
        );
        Ok(outcome)
    }

    async fn delete(&self, id: &FactionId) -> Result<bool> {
        self.deletes.lock().push(id.as_str().to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Error::Database("injected delete failure".into()));
        }
        self.inner.delete(id).await
    }

    async fn flush(&self) -> Result<()> {
        self.inner.flush().await
    }
}
