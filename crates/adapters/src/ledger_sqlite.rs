//! SQLite ledger store implementation

use async_trait::async_trait;
use feed_courier_domain::{LedgerError, LedgerStore, SyncedItem};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;

/// SQLite-backed ledger store
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Create a new SQLite ledger, initializing the database if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LedgerError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite ledger (for testing)
    pub async fn in_memory() -> Result<Self, LedgerError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS synced_posts (
                id TEXT PRIMARY KEY,
                synced_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_synced_posts_synced_at
            ON synced_posts(synced_at)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn has_synced(&self, id: &str) -> Result<bool, LedgerError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM synced_posts WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(count.0 > 0)
    }

    async fn mark_synced(&self, item: &SyncedItem) -> Result<(), LedgerError> {
        let synced_at_str = item
            .synced_at
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        // Re-inserting an existing id collapses to success
        sqlx::query(
            r#"
            INSERT INTO synced_posts (id, synced_at)
            VALUES (?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&item.id)
        .bind(&synced_at_str)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }

    async fn recent_synced(&self, limit: u32) -> Result<Vec<SyncedItem>, LedgerError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT id, synced_at FROM synced_posts
            ORDER BY synced_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|(id, synced_at_str)| {
                let synced_at = OffsetDateTime::parse(
                    &synced_at_str,
                    &time::format_description::well_known::Rfc3339,
                )
                .map_err(|e| LedgerError::Serialization(e.to_string()))?;

                Ok(SyncedItem { id, synced_at })
            })
            .collect()
    }

    async fn total_synced(&self) -> Result<u64, LedgerError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM synced_posts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(count.0 as u64)
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>, LedgerError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(row.map(|(value,)| value))
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record(id: &str, synced_at: OffsetDateTime) -> SyncedItem {
        SyncedItem {
            id: id.to_string(),
            synced_at,
        }
    }

    #[tokio::test]
    async fn test_mark_and_lookup_roundtrip() {
        let store = SqliteLedger::in_memory().await.unwrap();

        assert!(!store.has_synced("post1").await.unwrap());

        store
            .mark_synced(&record("post1", datetime!(2024-06-01 10:00:00 UTC)))
            .await
            .unwrap();

        assert!(store.has_synced("post1").await.unwrap());
        assert!(!store.has_synced("post2").await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_synced_is_idempotent() {
        let store = SqliteLedger::in_memory().await.unwrap();

        store
            .mark_synced(&record("post1", datetime!(2024-06-01 10:00:00 UTC)))
            .await
            .unwrap();
        store
            .mark_synced(&record("post1", datetime!(2024-06-02 10:00:00 UTC)))
            .await
            .unwrap();

        assert_eq!(store.total_synced().await.unwrap(), 1);

        // First write wins; the record is immutable
        let recent = store.recent_synced(10).await.unwrap();
        assert_eq!(recent[0].synced_at, datetime!(2024-06-01 10:00:00 UTC));
    }

    #[tokio::test]
    async fn test_recent_synced_orders_newest_first() {
        let store = SqliteLedger::in_memory().await.unwrap();

        store
            .mark_synced(&record("old", datetime!(2024-06-01 10:00:00 UTC)))
            .await
            .unwrap();
        store
            .mark_synced(&record("newer", datetime!(2024-06-02 10:00:00 UTC)))
            .await
            .unwrap();
        store
            .mark_synced(&record("newest", datetime!(2024-06-03 10:00:00 UTC)))
            .await
            .unwrap();

        let recent = store.recent_synced(2).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "newer"]);
    }

    #[tokio::test]
    async fn test_settings_upsert_last_write_wins() {
        let store = SqliteLedger::in_memory().await.unwrap();

        assert!(store.get_setting("SOURCE_FEED_ID").await.unwrap().is_none());

        store.set_setting("SOURCE_FEED_ID", "feed-1").await.unwrap();
        store.set_setting("SOURCE_FEED_ID", "feed-2").await.unwrap();

        assert_eq!(
            store.get_setting("SOURCE_FEED_ID").await.unwrap(),
            Some("feed-2".to_string())
        );
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("ledger.sqlite");

        {
            let store = SqliteLedger::new(&db_path).await.unwrap();
            store
                .mark_synced(&record("post1", datetime!(2024-06-01 10:00:00 UTC)))
                .await
                .unwrap();
            store.set_setting("SOURCE_FEED_ID", "feed-1").await.unwrap();
        }

        let store = SqliteLedger::new(&db_path).await.unwrap();
        assert!(store.has_synced("post1").await.unwrap());
        assert_eq!(
            store.get_setting("SOURCE_FEED_ID").await.unwrap(),
            Some("feed-1".to_string())
        );
    }
}
