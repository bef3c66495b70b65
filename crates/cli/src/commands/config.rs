//! Config command - configuration management
//!
//! `init` writes an example file; `set`/`get`/`list` manage values stored
//! in the ledger settings table, which override process defaults.

use anyhow::{Context, Result, anyhow};
use feed_courier_adapters::ledger::SqliteLedger;
use feed_courier_domain::{LedgerStore, config_keys};
use std::fs;
use std::path::PathBuf;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::commands::run::process_defaults;
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => init_config(path, force).await,
        ConfigCommands::Set { key, value } => set_setting(config_path, key, value).await,
        ConfigCommands::Get { key } => get_setting(config_path, key).await,
        ConfigCommands::List => list_settings(config_path).await,
    }
}

async fn init_config(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    let content = AppConfig::example_toml();

    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    fs::write(&path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    println!("Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit the config file or export SOURCE_API_KEY / MESSAGING_BOT_TOKEN");
    println!("  2. Store the feed and channel: feed-courier config set SOURCE_FEED_ID <id>");
    println!("  3. Run 'feed-courier doctor' to validate your setup");
    println!("  4. Run 'feed-courier run --once' to try a single cycle");

    Ok(())
}

async fn set_setting(config_path: Option<PathBuf>, key: String, value: String) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let ledger = open_durable_ledger(&config).await?;

    if !config_keys::REQUIRED.contains(&key.as_str()) {
        tracing::warn!(key = %key, "Key is not one of the recognized configuration keys");
    }

    ledger
        .set_setting(&key, &value)
        .await
        .map_err(|e| anyhow!("Failed to store setting: {}", e))?;

    println!("Stored {}", key);
    Ok(())
}

async fn get_setting(config_path: Option<PathBuf>, key: String) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let ledger = open_durable_ledger(&config).await?;

    match ledger
        .get_setting(&key)
        .await
        .map_err(|e| anyhow!("Failed to read setting: {}", e))?
    {
        Some(_) if is_secret_key(&key) => {
            println!("{} = (set, hidden)", key);
        }
        Some(value) => println!("{} = {}", key, value),
        None => println!("{} is not set", key),
    }

    Ok(())
}

async fn list_settings(config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let ledger = open_durable_ledger(&config).await?;
    let defaults = process_defaults(&config);

    for key in config_keys::REQUIRED {
        let stored = ledger
            .get_setting(key)
            .await
            .map_err(|e| anyhow!("Failed to read setting: {}", e))?;

        let state = if stored.is_some() {
            "stored setting"
        } else if default_present(&defaults, key) {
            "process default"
        } else {
            "missing"
        };

        println!("{:<24} {}", key, state);
    }

    Ok(())
}

async fn open_durable_ledger(config: &AppConfig) -> Result<SqliteLedger> {
    SqliteLedger::new(&config.general.ledger_db_path)
        .await
        .map_err(|e| {
            anyhow!(
                "Failed to open ledger database {}: {}",
                config.general.ledger_db_path.display(),
                e
            )
        })
}

fn default_present(defaults: &feed_courier_domain::ProcessDefaults, key: &str) -> bool {
    match key {
        config_keys::SOURCE_API_KEY => defaults.source_api_key.is_some(),
        config_keys::SOURCE_FEED_ID => defaults.source_feed_id.is_some(),
        config_keys::MESSAGING_BOT_TOKEN => defaults.bot_token.is_some(),
        config_keys::MESSAGING_CHANNEL_ID => defaults.channel_id.is_some(),
        _ => false,
    }
}

fn is_secret_key(key: &str) -> bool {
    key.contains("TOKEN") || key.contains("KEY")
}
