use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

/// Errors raised while setting up a store. Runtime storage errors never
/// escape the `RecordStore` trait, they collapse into its boolean results.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection failed with: {0}")]
    ConnectionError(#[from] sqlx::Error),
    #[error("migrations failed with: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

/// Persistence boundary for deduplicated records: existence-by-fingerprint
/// lookup and a conditional insert guarded by a unique constraint.
#[async_trait]
pub trait RecordStore {
    /// Whether an entry with this fingerprint is already persisted.
    ///
    /// Fails open: when storage cannot be reached the answer is `true`, so
    /// data whose uniqueness cannot be confirmed is never inserted.
    async fn exists(&self, fingerprint: &str) -> bool;

    /// Persist a new entry, returning whether it was written. `false`
    /// covers every storage failure, including losing an insert race on
    /// the fingerprint's unique constraint; nothing is partially written.
    async fn insert(&self, fingerprint: &str, record: &Value) -> bool;
}

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn new(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!().run(&self.pool).await?;

        Ok(())
    }

    async fn try_exists(&self, fingerprint: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM unique_data WHERE data_hash = $1")
                .bind(fingerprint)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.is_some())
    }

    async fn try_insert(&self, fingerprint: &str, record: &Value) -> Result<(), sqlx::Error> {
        let content = record.to_string();

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO unique_data (data_hash, data_content) VALUES ($1, $2)")
            .bind(fingerprint)
            .bind(content)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn exists(&self, fingerprint: &str) -> bool {
        match self.try_exists(fingerprint).await {
            Ok(exists) => exists,
            Err(error) => {
                // fail open: unconfirmed uniqueness is treated as a duplicate
                tracing::warn!("existence check failed, assuming duplicate: {}", error);
                metrics::counter!("dedup_store_exists_errors_total").increment(1);
                true
            }
        }
    }

    async fn insert(&self, fingerprint: &str, record: &Value) -> bool {
        match self.try_insert(fingerprint, record).await {
            Ok(()) => true,
            Err(error) => {
                // dropped transaction already rolled back
                if is_unique_violation(&error) {
                    tracing::warn!("lost insert race for fingerprint {}", fingerprint);
                    metrics::counter!("dedup_store_insert_conflicts_total").increment(1);
                } else {
                    tracing::error!("failed to insert record: {}", error);
                    metrics::counter!("dedup_store_insert_errors_total").increment(1);
                }
                false
            }
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

/// In-process store for tests and local runs. Mirrors the Postgres
/// semantics, including insert rejection on an already-present fingerprint.
/// Clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    pub fn get(&self, fingerprint: &str) -> Option<Value> {
        self.entries.lock().unwrap().get(fingerprint).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn exists(&self, fingerprint: &str) -> bool {
        self.entries.lock().unwrap().contains_key(fingerprint)
    }

    async fn insert(&self, fingerprint: &str, record: &Value) -> bool {
        match self.entries.lock().unwrap().entry(fingerprint.to_owned()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(record.clone());
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::default();
        let record = json!({"name": "Alice", "email": "a@x.com"});

        assert!(!store.exists("fp1").await);
        assert!(store.insert("fp1", &record).await);
        assert!(store.exists("fp1").await);
        assert_eq!(store.get("fp1"), Some(record));
    }

    #[tokio::test]
    async fn memory_store_rejects_duplicate_fingerprint() {
        let store = MemoryStore::default();
        let record = json!({"name": "Alice", "email": "a@x.com"});

        assert!(store.insert("fp1", &record).await);
        assert!(!store.insert("fp1", &record).await);
        assert_eq!(store.len(), 1);
    }
}
