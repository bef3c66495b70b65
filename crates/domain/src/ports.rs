//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{ChannelTarget, FeedCredentials, FeedItem, OutboundMessage, SyncedItem};

/// Error type for feed source operations
#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport-level failure; the cycle may be retried later
    #[error("Network error: {0}")]
    Network(String),
    /// Structured error reported by the remote service; not retryable
    /// without revisiting credentials
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Malformed feed payload: {0}")]
    Decode(String),
}

/// Port for fetching recent items from the remote feed
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch up to `max_results` of the most recent items, newest first
    async fn fetch_recent(
        &self,
        credentials: &FeedCredentials,
        max_results: u32,
    ) -> Result<Vec<FeedItem>, FeedError>;
}

/// Error type for enrichment operations
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Timeout")]
    Timeout,
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Port for transforming a raw item into a formatted caption.
///
/// Failures are typed so callers can observe degraded behavior; the caption
/// use case converts any error into a fallback caption before the engine
/// sees it.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, item: &FeedItem) -> Result<String, EnrichError>;
}

/// Error type for delivery operations
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
}

/// Port for sending a composed message to the destination channel
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Deliver the message. Exactly one successful provider call per
    /// successful invocation; implementations may make one additional
    /// degraded attempt (drop the image) before failing.
    async fn deliver(
        &self,
        target: &ChannelTarget,
        message: &OutboundMessage,
    ) -> Result<(), DeliveryError>;
}

/// Error type for ledger store operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for the durable de-duplication ledger and settings table
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// True iff an item with this id has been recorded as delivered
    async fn has_synced(&self, id: &str) -> Result<bool, LedgerError>;

    /// Idempotent insert; recording an already-present id is a no-op
    async fn mark_synced(&self, item: &SyncedItem) -> Result<(), LedgerError>;

    /// Most recently synced items, newest first
    async fn recent_synced(&self, limit: u32) -> Result<Vec<SyncedItem>, LedgerError>;

    /// Total number of recorded items
    async fn total_synced(&self) -> Result<u64, LedgerError>;

    /// Stored configuration value, if present
    async fn get_setting(&self, key: &str) -> Result<Option<String>, LedgerError>;

    /// Upsert a configuration value (last write wins)
    async fn set_setting(&self, key: &str, value: &str) -> Result<(), LedgerError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
