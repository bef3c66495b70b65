//! Domain models and value objects

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Configuration keys recognized by the sync engine.
///
/// Each key resolves from a per-cycle override, then the ledger's settings
/// table, then the process-level default, in that order.
pub mod config_keys {
    pub const SOURCE_API_KEY: &str = "SOURCE_API_KEY";
    pub const SOURCE_FEED_ID: &str = "SOURCE_FEED_ID";
    pub const MESSAGING_BOT_TOKEN: &str = "MESSAGING_BOT_TOKEN";
    pub const MESSAGING_CHANNEL_ID: &str = "MESSAGING_CHANNEL_ID";

    /// All keys the engine requires to run a cycle
    pub const REQUIRED: [&str; 4] = [
        SOURCE_API_KEY,
        SOURCE_FEED_ID,
        MESSAGING_BOT_TOKEN,
        MESSAGING_CHANNEL_ID,
    ];
}

/// A normalized post fetched from the remote feed (not persisted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    /// Opaque unique identifier assigned by the feed source
    pub id: String,
    /// Post title
    pub title: String,
    /// Raw HTML body
    pub body_html: String,
    /// Canonical URL of the post
    pub url: String,
    /// Image to attach, if the source exposes or embeds one
    pub image_url: Option<String>,
}

/// A feed item that has been successfully delivered.
///
/// Created exactly once, at the moment delivery is confirmed; never updated,
/// never deleted (append-only ledger).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncedItem {
    /// Feed item id (primary key)
    pub id: String,
    /// When delivery succeeded
    #[serde(with = "time::serde::rfc3339")]
    pub synced_at: OffsetDateTime,
}

/// Composed content ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Full message text (caption plus call-to-action line)
    pub text: String,
    /// Image to attach, if any
    pub image_url: Option<String>,
}

/// Credentials for the feed source
#[derive(Clone)]
pub struct FeedCredentials {
    pub api_key: SecretString,
    pub feed_id: String,
}

/// Destination channel for deliveries
#[derive(Clone)]
pub struct ChannelTarget {
    pub bot_token: SecretString,
    pub chat_id: String,
}

/// Per-cycle configuration overrides, highest priority in resolution
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source_api_key: Option<String>,
    pub source_feed_id: Option<String>,
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
}

/// Process-level configuration defaults, lowest priority in resolution
#[derive(Clone, Default)]
pub struct ProcessDefaults {
    pub source_api_key: Option<SecretString>,
    pub source_feed_id: Option<String>,
    pub bot_token: Option<SecretString>,
    pub channel_id: Option<String>,
}

/// A per-item failure recorded during a cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item_id: String,
    pub reason: String,
}

/// Aggregate outcome of one completed sync cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Correlation id for this cycle (log field, not persisted)
    pub cycle_id: Uuid,
    /// Candidates considered after the per-cycle cap
    pub examined: usize,
    /// Items delivered and recorded this cycle
    pub delivered: usize,
    /// Isolated per-item failures
    pub errors: Vec<ItemFailure>,
}

impl SyncReport {
    pub fn empty(cycle_id: Uuid) -> Self {
        Self {
            cycle_id,
            examined: 0,
            delivered: 0,
            errors: vec![],
        }
    }
}

/// Snapshot returned by the status query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Total items ever recorded in the ledger
    pub total_synced: u64,
    /// Most recently synced items, newest first
    pub recent: Vec<SyncedItem>,
    /// Whether all required configuration values resolve
    pub configured: bool,
}
