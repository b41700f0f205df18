//! SQLite faction store implementation.
//!
//! Stores one row per faction (`id`, encoded `body`, `updated_at`). Diesel
//! calls are blocking, so each operation runs on the blocking thread pool.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::FactionRow;
use crate::adapter::outbound::sqlite::database::schema::factions;
use crate::domain::FactionId;
use crate::error::{Error, Result};
use crate::port::outbound::store::{BatchOutcome, FactionStore, StoredRecord};

/// SQLite-backed faction store.
///
/// Batches are committed in a single transaction: either every record of a
/// batch is written or none is.
#[derive(Clone)]
pub struct SqliteStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteStore {
    /// Create a new SQLite store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run `f` with a pooled connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
            f(&mut conn)
        })
        .await?
    }
}

#[async_trait]
impl FactionStore for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn read_all(&self) -> Result<Vec<StoredRecord>> {
        self.with_conn(|conn| {
            let rows: Vec<FactionRow> = factions::table
                .select(FactionRow::as_select())
                .order(factions::id.asc())
                .load(conn)
                .map_err(|e| Error::Database(e.to_string()))?;

            Ok(rows
                .into_iter()
                .map(|row| StoredRecord::new(row.id, row.body))
                .collect())
        })
        .await
    }

    async fn write_batch(&self, records: Vec<StoredRecord>) -> Result<BatchOutcome> {
        if records.is_empty() {
            return Ok(BatchOutcome::default());
        }

        self.with_conn(move |conn| {
            let updated_at = Utc::now().to_rfc3339();
            let rows: Vec<FactionRow> = records
                .into_iter()
                .map(|record| FactionRow {
                    id: record.key,
                    body: record.body,
                    updated_at: updated_at.clone(),
                })
                .collect();

            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                for row in &rows {
                    diesel::replace_into(factions::table)
                        .values(row)
                        .execute(conn)?;
                }
                Ok(())
            })
            .map_err(|e| Error::Database(e.to_string()))?;

            Ok(BatchOutcome::all_written(
                rows.into_iter().map(|row| row.id).collect(),
            ))
        })
        .await
    }

    async fn delete(&self, id: &FactionId) -> Result<bool> {
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let deleted = diesel::delete(factions::table.find(id))
                .execute(conn)
                .map_err(|e| Error::Database(e.to_string()))?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn flush(&self) -> Result<()> {
        // Every batch commits its own transaction.
        Ok(())
    }
}
