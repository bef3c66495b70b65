//! Doctor command - validate configuration and show readiness

use anyhow::Result;
use feed_courier_adapters::ledger::SqliteLedger;
use feed_courier_domain::{LedgerStore, ProcessDefaults, config_keys};
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::commands::run::process_defaults;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    ledger: CheckResult,
    source_api_key: CheckResult,
    source_feed_id: CheckResult,
    bot_token: CheckResult,
    channel_id: CheckResult,
    enrich: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        ledger: CheckResult::error("Not checked"),
        source_api_key: CheckResult::error("Not checked"),
        source_feed_id: CheckResult::error("Not checked"),
        bot_token: CheckResult::error("Not checked"),
        channel_id: CheckResult::error("Not checked"),
        enrich: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {}", e));
            None
        }
    };

    if let Some(ref config) = config {
        // Check ledger
        let ledger = match SqliteLedger::new(&config.general.ledger_db_path).await {
            Ok(store) => {
                report.ledger = CheckResult::ok(format!(
                    "Ledger open: {}",
                    config.general.ledger_db_path.display()
                ));
                Some(store)
            }
            Err(e) => {
                report.ledger = CheckResult::warn(format!(
                    "Cannot open ledger database ({}); runs will use a non-durable in-memory store",
                    e
                ));
                None
            }
        };

        // Check the four required values
        let defaults = process_defaults(config);

        report.source_api_key =
            check_value(ledger.as_ref(), &defaults, config_keys::SOURCE_API_KEY).await;
        report.source_feed_id =
            check_value(ledger.as_ref(), &defaults, config_keys::SOURCE_FEED_ID).await;
        report.bot_token =
            check_value(ledger.as_ref(), &defaults, config_keys::MESSAGING_BOT_TOKEN).await;
        report.channel_id =
            check_value(ledger.as_ref(), &defaults, config_keys::MESSAGING_CHANNEL_ID).await;

        // Check enricher selection
        report.enrich = check_enrich(config);
    }

    // Only a broken config or enricher selection blocks running; missing
    // values and a degraded ledger are warnings
    let has_error = report.config.is_error() || report.enrich.is_error();
    let all_ok = [
        &report.config,
        &report.ledger,
        &report.source_api_key,
        &report.source_feed_id,
        &report.bot_token,
        &report.channel_id,
        &report.enrich,
    ]
    .iter()
    .all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_value(
    ledger: Option<&SqliteLedger>,
    defaults: &ProcessDefaults,
    key: &'static str,
) -> CheckResult {
    if let Some(ledger) = ledger {
        match ledger.get_setting(key).await {
            Ok(Some(_)) => return CheckResult::ok(format!("{} (stored setting)", key)),
            Ok(None) => {}
            Err(e) => {
                return CheckResult::warn(format!("{}: settings lookup failed: {}", key, e));
            }
        }
    }

    let default_present = match key {
        config_keys::SOURCE_API_KEY => defaults.source_api_key.is_some(),
        config_keys::SOURCE_FEED_ID => defaults.source_feed_id.is_some(),
        config_keys::MESSAGING_BOT_TOKEN => defaults.bot_token.is_some(),
        config_keys::MESSAGING_CHANNEL_ID => defaults.channel_id.is_some(),
        _ => false,
    };

    if default_present {
        CheckResult::ok(format!("{} (process default)", key))
    } else {
        CheckResult::warn(format!("{} not set", key))
    }
}

fn check_enrich(config: &AppConfig) -> CheckResult {
    match config.enrich.provider.as_str() {
        "template" => CheckResult::ok("Provider: template (local)"),
        "stub" => CheckResult::ok("Provider: stub (offline)"),
        "remote" => {
            if config.enrich.base_url.trim().is_empty() {
                return CheckResult::error("Remote enricher requires enrich.base_url");
            }
            match std::env::var(&config.enrich.api_key_env) {
                Ok(v) if !v.is_empty() => CheckResult::ok(format!(
                    "Provider: remote, API key: {} (set)",
                    config.enrich.api_key_env
                )),
                _ => CheckResult::warn(format!(
                    "Provider: remote, API key: {} (not set)",
                    config.enrich.api_key_env
                )),
            }
        }
        other => CheckResult::error(format!("Unknown enrich provider: {}", other)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("feed-courier Doctor Report");
    println!("==========================");
    println!();

    print_check("Config", &report.config);
    print_check("Ledger", &report.ledger);
    print_check("Source API key", &report.source_api_key);
    print_check("Source feed id", &report.source_feed_id);
    print_check("Bot token", &report.bot_token);
    print_check("Channel id", &report.channel_id);
    print_check("Enricher", &report.enrich);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: feed-courier run --once");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
