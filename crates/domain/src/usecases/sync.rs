//! Sync engine - the reconciliation core
//!
//! One cycle: resolve configuration, fetch the recent feed page, filter out
//! already-synced items, then for each candidate enrich, compose, deliver,
//! and record. Per-item failures are isolated; only configuration and
//! fetch-stage failures abort a cycle.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    model::{
        ChannelTarget, ConfigOverrides, FeedCredentials, ItemFailure, ProcessDefaults, SyncReport,
        SyncStatus, SyncedItem, config_keys,
    },
    ports::{Clock, DeliverySink, Enricher, FeedError, FeedSource, LedgerError, LedgerStore},
    usecases::{
        caption::{CaptionConfig, CaptionUseCase},
        compose::{ComposeConfig, Composer},
    },
};

/// Configuration for the sync engine
#[derive(Debug, Clone)]
pub struct SyncEngineConfig {
    /// Maximum items requested from the feed per cycle
    pub fetch_page_size: u32,
    /// Maximum items processed per cycle (cost cap, not correctness)
    pub max_per_cycle: usize,
    /// Items returned by the status query
    pub status_recent_limit: u32,
    /// Caption use case config
    pub caption: CaptionConfig,
    /// Composer config
    pub compose: ComposeConfig,
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self {
            fetch_page_size: 10,
            max_per_cycle: 3,
            status_recent_limit: 10,
            caption: CaptionConfig::default(),
            compose: ComposeConfig::default(),
        }
    }
}

/// Errors that abort a whole cycle
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Missing required configuration value: {key}")]
    Config { key: &'static str },
    #[error("Feed fetch failed: {0}")]
    Fetch(#[from] FeedError),
    #[error("A sync cycle is already in flight")]
    CycleInFlight,
}

/// Reconciliation engine orchestrating fetch, dedup, enrich, deliver, record
#[derive(Clone)]
pub struct SyncEngine<F, E, D, L, Cl>
where
    F: FeedSource + ?Sized,
    E: Enricher + ?Sized,
    D: DeliverySink + ?Sized,
    L: LedgerStore + ?Sized,
    Cl: Clock + ?Sized,
{
    feed: Arc<F>,
    enricher: Arc<E>,
    delivery: Arc<D>,
    ledger: Arc<L>,
    clock: Arc<Cl>,
    defaults: ProcessDefaults,
    config: SyncEngineConfig,
    // Non-reentrant gate: two interleaved cycles could both observe
    // "not yet synced" before either writes the ledger
    cycle_gate: Arc<Mutex<()>>,
}

impl<F, E, D, L, Cl> SyncEngine<F, E, D, L, Cl>
where
    F: FeedSource + ?Sized,
    E: Enricher + ?Sized,
    D: DeliverySink + ?Sized,
    L: LedgerStore + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        feed: Arc<F>,
        enricher: Arc<E>,
        delivery: Arc<D>,
        ledger: Arc<L>,
        clock: Arc<Cl>,
        defaults: ProcessDefaults,
        config: SyncEngineConfig,
    ) -> Self {
        Self {
            feed,
            enricher,
            delivery,
            ledger,
            clock,
            defaults,
            config,
            cycle_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Run a single sync cycle.
    ///
    /// A trigger arriving while another cycle is in flight is rejected with
    /// [`SyncError::CycleInFlight`].
    pub async fn run_cycle(&self, overrides: &ConfigOverrides) -> Result<SyncReport, SyncError> {
        let _gate = self
            .cycle_gate
            .try_lock()
            .map_err(|_| SyncError::CycleInFlight)?;

        let cycle_id = Uuid::new_v4();

        // Resolve configuration before any network call
        let (credentials, target) = self.resolve_config(overrides).await?;

        tracing::info!(
            cycle_id = %cycle_id,
            feed_id = %credentials.feed_id,
            page_size = self.config.fetch_page_size,
            "Fetching feed"
        );

        let items = self
            .feed
            .fetch_recent(&credentials, self.config.fetch_page_size)
            .await?;

        if items.is_empty() {
            tracing::debug!(cycle_id = %cycle_id, "Feed returned no items");
            return Ok(SyncReport::empty(cycle_id));
        }

        // Bounded prefix, in fetch order (source returns newest first)
        let candidates: Vec<_> = items.into_iter().take(self.config.max_per_cycle).collect();

        let caption_usecase =
            CaptionUseCase::new(self.enricher.as_ref(), self.config.caption.clone());
        let composer = Composer::new(self.config.compose.clone());

        let mut report = SyncReport::empty(cycle_id);
        report.examined = candidates.len();

        for item in &candidates {
            match self.ledger.has_synced(&item.id).await {
                Ok(true) => {
                    tracing::debug!(item_id = %item.id, "Already synced, skipping");
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    // Without a dedup answer a send risks a duplicate; the
                    // item stays a candidate for the next cycle
                    tracing::warn!(item_id = %item.id, error = %e, "Ledger lookup failed");
                    report.errors.push(ItemFailure {
                        item_id: item.id.clone(),
                        reason: format!("ledger lookup failed: {}", e),
                    });
                    continue;
                }
            }

            let caption = caption_usecase.caption(item).await;
            let message = composer.compose(&caption, item);

            if let Err(e) = self.delivery.deliver(&target, &message).await {
                tracing::error!(item_id = %item.id, error = %e, "Delivery failed");
                report.errors.push(ItemFailure {
                    item_id: item.id.clone(),
                    reason: e.to_string(),
                });
                continue;
            }

            let record = SyncedItem {
                id: item.id.clone(),
                synced_at: self.clock.now(),
            };

            if let Err(e) = self.ledger.mark_synced(&record).await {
                // Delivery already happened; losing the record can cause at
                // most one duplicate send on a later cycle
                tracing::error!(item_id = %item.id, error = %e, "Failed to record synced item");
            }

            report.delivered += 1;
        }

        tracing::info!(
            cycle_id = %cycle_id,
            examined = report.examined,
            delivered = report.delivered,
            errors = report.errors.len(),
            "Cycle complete"
        );

        Ok(report)
    }

    /// Ledger totals plus whether the engine could run a cycle right now.
    /// Makes no network calls.
    pub async fn status(&self) -> Result<SyncStatus, LedgerError> {
        let total_synced = self.ledger.total_synced().await?;
        let recent = self
            .ledger
            .recent_synced(self.config.status_recent_limit)
            .await?;
        let configured = self
            .resolve_config(&ConfigOverrides::default())
            .await
            .is_ok();

        Ok(SyncStatus {
            total_synced,
            recent,
            configured,
        })
    }

    async fn resolve_config(
        &self,
        overrides: &ConfigOverrides,
    ) -> Result<(FeedCredentials, ChannelTarget), SyncError> {
        let api_key = self
            .resolve_value(
                overrides.source_api_key.as_deref(),
                config_keys::SOURCE_API_KEY,
                self.defaults
                    .source_api_key
                    .as_ref()
                    .map(|s| s.expose_secret().to_string()),
            )
            .await?;

        let feed_id = self
            .resolve_value(
                overrides.source_feed_id.as_deref(),
                config_keys::SOURCE_FEED_ID,
                self.defaults.source_feed_id.clone(),
            )
            .await?;

        let bot_token = self
            .resolve_value(
                overrides.bot_token.as_deref(),
                config_keys::MESSAGING_BOT_TOKEN,
                self.defaults
                    .bot_token
                    .as_ref()
                    .map(|s| s.expose_secret().to_string()),
            )
            .await?;

        let chat_id = self
            .resolve_value(
                overrides.channel_id.as_deref(),
                config_keys::MESSAGING_CHANNEL_ID,
                self.defaults.channel_id.clone(),
            )
            .await?;

        Ok((
            FeedCredentials {
                api_key: SecretString::from(api_key),
                feed_id,
            },
            ChannelTarget {
                bot_token: SecretString::from(bot_token),
                chat_id,
            },
        ))
    }

    /// Override > stored setting > process default
    async fn resolve_value(
        &self,
        override_value: Option<&str>,
        key: &'static str,
        default: Option<String>,
    ) -> Result<String, SyncError> {
        if let Some(value) = override_value {
            if !value.is_empty() {
                return Ok(value.to_string());
            }
        }

        match self.ledger.get_setting(key).await {
            Ok(Some(value)) if !value.is_empty() => return Ok(value),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Settings lookup failed, using process default");
            }
        }

        default
            .filter(|value| !value.is_empty())
            .ok_or(SyncError::Config { key })
    }
}
