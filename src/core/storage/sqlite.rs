use super::traits::{Storage, StorageBatch, StoreItems};
use crate::error::StorageError;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

/// SQLite-backed storage using a sqlx async pool. One row per layer record.
pub struct SqliteStorage {
    pool: SqlitePool,
}

const STATE_RECORDS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS state_records (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

const UPSERT_RECORD: &str = "
INSERT INTO state_records (key, value, updated_at) VALUES ($1, $2, $3)
ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

impl SqliteStorage {
    /// Open (creating if needed) a database file.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await?;
        Self::new(pool).await
    }

    /// Private in-memory database; a single connection keeps it alive.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::new(pool).await
    }

    /// Wrap an existing pool and create the schema.
    pub async fn new(pool: SqlitePool) -> Result<Self, StorageError> {
        sqlx::query(STATE_RECORDS_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Stored keys, optionally restricted to a prefix, sorted.
    pub async fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        let rows: Vec<(String,)> = match prefix {
            Some(prefix) => {
                sqlx::query_as("SELECT key FROM state_records WHERE substr(key, 1, length($1)) = $1 ORDER BY key")
                    .bind(prefix)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT key FROM state_records ORDER BY key")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }
}

async fn upsert_all(
    tx: &mut Transaction<'_, Sqlite>,
    items: StoreItems,
) -> Result<(), StorageError> {
    let updated_at = Utc::now().to_rfc3339();
    for (key, value) in items {
        let encoded = serde_json::to_string(&value).map_err(|e| StorageError::Serialization {
            key: key.clone(),
            message: e.to_string(),
        })?;
        sqlx::query(UPSERT_RECORD)
            .bind(&key)
            .bind(encoded)
            .bind(&updated_at)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn delete_all(tx: &mut Transaction<'_, Sqlite>, keys: &[String]) -> Result<(), StorageError> {
    for key in keys {
        sqlx::query("DELETE FROM state_records WHERE key = $1")
            .bind(key)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

impl Storage for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn read<'a>(
        &'a self,
        keys: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<StoreItems, StorageError>> + Send + 'a>> {
        Box::pin(async move {
            let mut items = StoreItems::with_capacity(keys.len());
            for key in keys {
                let row: Option<(String,)> =
                    sqlx::query_as("SELECT value FROM state_records WHERE key = $1")
                        .bind(key)
                        .fetch_optional(&self.pool)
                        .await?;
                if let Some((raw,)) = row {
                    let value = serde_json::from_str(&raw).map_err(|e| {
                        StorageError::Serialization {
                            key: key.clone(),
                            message: e.to_string(),
                        }
                    })?;
                    items.insert(key.clone(), value);
                }
            }
            Ok(items)
        })
    }

    fn write<'a>(
        &'a self,
        items: StoreItems,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;
            upsert_all(&mut tx, items).await?;
            tx.commit().await?;
            Ok(())
        })
    }

    fn delete<'a>(
        &'a self,
        keys: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;
            delete_all(&mut tx, keys).await?;
            tx.commit().await?;
            Ok(())
        })
    }

    fn apply<'a>(
        &'a self,
        batch: StorageBatch,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + 'a>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;
            delete_all(&mut tx, &batch.deletes).await?;
            upsert_all(&mut tx, batch.upserts).await?;
            tx.commit().await?;
            tracing::debug!(backend = "sqlite", "storage batch committed");
            Ok(())
        })
    }
}
