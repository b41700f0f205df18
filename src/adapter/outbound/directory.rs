//! Directory store: one JSON file per faction.
//!
//! Each record lives in `<dir>/<id>.json`. Writes go to a temporary file
//! that is synced and renamed over the target, so a crash never leaves a
//! half-written record behind. Batches are not atomic as a whole: every
//! record succeeds or fails on its own and failures are reported in the
//! [`BatchOutcome`].

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use crate::domain::FactionId;
use crate::error::{Error, Result};
use crate::port::outbound::store::{BatchOutcome, FactionStore, StoredRecord};

const EXTENSION: &str = "json";

/// File-per-record faction store.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{EXTENSION}"))
    }

    fn write_record(&self, record: &StoredRecord) -> io::Result<()> {
        let target = self.path_for(&record.key);
        let tmp = self.root.join(format!(".{}.{EXTENSION}.tmp", record.key));

        let mut file = File::create(&tmp)?;
        file.write_all(record.body.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &target)
    }

    fn read_records(root: &Path) -> Result<Vec<StoredRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if key.starts_with('.') {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(body) => records.push(StoredRecord::new(key, body)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable faction file");
                }
            }
        }
        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }
}

#[async_trait]
impl FactionStore for DirectoryStore {
    fn name(&self) -> &'static str {
        "directory"
    }

    async fn read_all(&self) -> Result<Vec<StoredRecord>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || Self::read_records(&root)).await?
    }

    async fn write_batch(&self, records: Vec<StoredRecord>) -> Result<BatchOutcome> {
        let store = self.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut outcome = BatchOutcome::default();
            for record in records {
                match store.write_record(&record) {
                    Ok(()) => outcome.written.push(record.key),
                    Err(e) => outcome.failed.push((record.key, Error::Io(e))),
                }
            }
            outcome
        })
        .await?;
        Ok(outcome)
    }

    async fn delete(&self, id: &FactionId) -> Result<bool> {
        let path = self.path_for(id.as_str());
        tokio::task::spawn_blocking(move || match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
        })
        .await?
    }

    async fn flush(&self) -> Result<()> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            // Persist the renames themselves.
            File::open(&root)?.sync_all()?;
            Ok(())
        })
        .await?
    }
}
