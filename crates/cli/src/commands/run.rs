//! Run command - poll the feed and deliver new posts

use anyhow::{Context, Result, bail};
use feed_courier_adapters::{
    blogger::BloggerFeedSource,
    enrich::{EnrichHttpConfig, RemoteEnricher, StubEnricher, TemplateEnricher},
    ledger::{InMemoryLedger, SqliteLedger},
    telegram::TelegramDelivery,
};
use feed_courier_domain::{
    ConfigOverrides, Enricher, LedgerStore, ProcessDefaults, SystemClock, config_keys,
    usecases::{
        CaptionConfig, ComposeConfig, SyncEngine, SyncEngineConfig, SyncError,
    },
};
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::args::RunArgs;
use crate::config::AppConfig;

pub(crate) type Engine =
    SyncEngine<BloggerFeedSource, dyn Enricher, TelegramDelivery, dyn LedgerStore, SystemClock>;

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    tracing::info!(
        once = args.once,
        feed_id_override = ?args.feed_id,
        channel_override = ?args.channel_id,
        "Starting feed-courier run"
    );

    let engine = build_engine(&config).await?;

    let overrides = ConfigOverrides {
        source_feed_id: args.feed_id,
        channel_id: args.channel_id,
        ..Default::default()
    };

    if args.once {
        let report = engine.run_cycle(&overrides).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    // Continuous polling loop
    let poll_interval = Duration::from_secs(config.general.poll_interval_secs.max(1));
    let mut ticker = interval(poll_interval);

    // Set up graceful shutdown
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        tracing::info!("Shutdown signal received");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match engine.run_cycle(&overrides).await {
                    Ok(report) => {
                        if report.examined > 0 {
                            tracing::info!(
                                delivered = report.delivered,
                                errors = report.errors.len(),
                                "Sync cycle complete"
                            );
                        }
                    }
                    Err(SyncError::CycleInFlight) => {
                        tracing::debug!("Previous cycle still in flight, skipping tick");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Sync cycle failed");
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutting down gracefully");
                break;
            }
        }
    }

    Ok(())
}

/// Open the durable ledger, degrading to the in-memory store if that fails.
/// The rest of the system stays operable without durability.
pub(crate) async fn build_ledger(config: &AppConfig) -> Arc<dyn LedgerStore> {
    match SqliteLedger::new(&config.general.ledger_db_path).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %config.general.ledger_db_path.display(),
                "Failed to open ledger database, using in-memory store (deduplication will not survive restarts)"
            );
            Arc::new(InMemoryLedger::new())
        }
    }
}

pub(crate) fn build_enricher(config: &AppConfig) -> Result<Arc<dyn Enricher>> {
    match config.enrich.provider.as_str() {
        "template" => Ok(Arc::new(TemplateEnricher::new(
            config.enrich.excerpt_max_chars,
        ))),
        "remote" => {
            if config.enrich.base_url.trim().is_empty() {
                bail!("Remote enricher requires enrich.base_url");
            }
            let api_key = load_secret(&config.enrich.api_key_env)?;
            Ok(Arc::new(RemoteEnricher::new(
                config.enrich.base_url.clone(),
                api_key,
                EnrichHttpConfig {
                    timeout_secs: config.enrich.timeout_secs,
                    retries: config.enrich.retries,
                },
            )))
        }
        "stub" => Ok(Arc::new(StubEnricher::titled())),
        other => bail!("Unknown enrich provider: {}", other),
    }
}

/// Process-level defaults for the four required configuration values
pub(crate) fn process_defaults(config: &AppConfig) -> ProcessDefaults {
    ProcessDefaults {
        source_api_key: optional_env(&config.source.api_key_env).map(SecretString::from),
        source_feed_id: config
            .source
            .feed_id
            .clone()
            .or_else(|| optional_env(config_keys::SOURCE_FEED_ID)),
        bot_token: optional_env(&config.messaging.bot_token_env).map(SecretString::from),
        channel_id: config
            .messaging
            .channel_id
            .clone()
            .or_else(|| optional_env(config_keys::MESSAGING_CHANNEL_ID)),
    }
}

pub(crate) async fn build_engine(config: &AppConfig) -> Result<Engine> {
    let ledger = build_ledger(config).await;
    let enricher = build_enricher(config)?;

    let engine_config = SyncEngineConfig {
        fetch_page_size: config.general.fetch_page_size,
        max_per_cycle: config.general.max_per_cycle,
        status_recent_limit: 10,
        caption: CaptionConfig {
            excerpt_max_chars: config.enrich.excerpt_max_chars,
        },
        compose: ComposeConfig {
            call_to_action: config.compose.call_to_action.clone(),
            max_chars: config.compose.max_chars,
        },
    };

    Ok(SyncEngine::new(
        Arc::new(BloggerFeedSource::new()),
        enricher,
        Arc::new(TelegramDelivery::new()),
        ledger,
        Arc::new(SystemClock),
        process_defaults(config),
        engine_config,
    ))
}

pub(crate) fn load_secret(env_var: &str) -> Result<SecretString> {
    let value = std::env::var(env_var)
        .with_context(|| format!("Environment variable {} not set", env_var))?;

    if value.is_empty() {
        bail!("Environment variable {} is empty", env_var);
    }

    Ok(SecretString::from(value))
}

pub(crate) fn optional_env(env_var: &str) -> Option<String> {
    std::env::var(env_var).ok().filter(|v| !v.is_empty())
}
