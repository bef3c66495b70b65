//! Status command - ledger totals and configuration state

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::args::StatusArgs;
use crate::commands::run::build_engine;
use crate::config::AppConfig;

pub async fn execute(args: StatusArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let engine = build_engine(&config).await?;
    let status = engine.status().await.context("Failed to query status")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("feed-courier status");
    println!("===================");
    println!(
        "Configured:   {}",
        if status.configured { "yes" } else { "no" }
    );
    println!("Total synced: {}", status.total_synced);

    if status.recent.is_empty() {
        println!("Recent:       (none)");
    } else {
        println!("Recent:");
        for item in &status.recent {
            let synced_at = item
                .synced_at
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "-".to_string());
            println!("  {}  {}", synced_at, item.id);
        }
    }

    if !status.configured {
        println!();
        println!("Run 'feed-courier doctor' to see which values are missing.");
    }

    Ok(())
}
