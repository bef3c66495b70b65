//! In-memory ledger store for testing and degraded (non-durable) mode

use async_trait::async_trait;
use feed_courier_domain::{LedgerError, LedgerStore, SyncedItem};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory ledger store implementation.
///
/// Used when the durable store cannot be opened; deduplication holds for
/// the process lifetime only.
pub struct InMemoryLedger {
    // Insertion order doubles as sync order
    synced: RwLock<Vec<SyncedItem>>,
    settings: RwLock<HashMap<String, String>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            synced: RwLock::new(Vec::new()),
            settings: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn has_synced(&self, id: &str) -> Result<bool, LedgerError> {
        let synced = self
            .synced
            .read()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(synced.iter().any(|r| r.id == id))
    }

    async fn mark_synced(&self, item: &SyncedItem) -> Result<(), LedgerError> {
        let mut synced = self
            .synced
            .write()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        if !synced.iter().any(|r| r.id == item.id) {
            synced.push(item.clone());
        }
        Ok(())
    }

    async fn recent_synced(&self, limit: u32) -> Result<Vec<SyncedItem>, LedgerError> {
        let synced = self
            .synced
            .read()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(synced.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn total_synced(&self) -> Result<u64, LedgerError> {
        let synced = self
            .synced
            .read()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(synced.len() as u64)
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>, LedgerError> {
        let settings = self
            .settings
            .read()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(settings.get(key).cloned())
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        let mut settings = self
            .settings
            .write()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        settings.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record(id: &str) -> SyncedItem {
        SyncedItem {
            id: id.to_string(),
            synced_at: datetime!(2024-06-01 10:00:00 UTC),
        }
    }

    #[tokio::test]
    async fn test_mark_and_lookup_roundtrip() {
        let store = InMemoryLedger::new();

        assert!(!store.has_synced("post1").await.unwrap());
        store.mark_synced(&record("post1")).await.unwrap();
        assert!(store.has_synced("post1").await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_synced_is_idempotent() {
        let store = InMemoryLedger::new();

        store.mark_synced(&record("post1")).await.unwrap();
        store.mark_synced(&record("post1")).await.unwrap();

        assert_eq!(store.total_synced().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_recent_synced_orders_newest_first() {
        let store = InMemoryLedger::new();

        store.mark_synced(&record("old")).await.unwrap();
        store.mark_synced(&record("newer")).await.unwrap();
        store.mark_synced(&record("newest")).await.unwrap();

        let recent = store.recent_synced(2).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "newer"]);
    }

    #[tokio::test]
    async fn test_settings_upsert_last_write_wins() {
        let store = InMemoryLedger::new();

        assert!(store.get_setting("SOURCE_FEED_ID").await.unwrap().is_none());

        store.set_setting("SOURCE_FEED_ID", "feed-1").await.unwrap();
        store.set_setting("SOURCE_FEED_ID", "feed-2").await.unwrap();

        assert_eq!(
            store.get_setting("SOURCE_FEED_ID").await.unwrap(),
            Some("feed-2".to_string())
        );
    }
}
