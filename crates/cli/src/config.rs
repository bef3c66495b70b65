//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub messaging: MessagingConfig,

    #[serde(default)]
    pub enrich: EnrichConfig,

    #[serde(default)]
    pub compose: ComposeSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_ledger_db_path")]
    pub ledger_db_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_fetch_page_size")]
    pub fetch_page_size: u32,

    #[serde(default = "default_max_per_cycle")]
    pub max_per_cycle: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_api_key_env")]
    pub api_key_env: String,

    /// Feed id; may also come from the environment or a stored setting
    #[serde(default)]
    pub feed_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    /// Destination channel; may also come from the environment or a stored
    /// setting
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Enricher implementation: template, remote, stub
    #[serde(default = "default_enrich_provider")]
    pub provider: String,

    #[serde(default)]
    pub base_url: String,

    #[serde(default = "default_enrich_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_enrich_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_enrich_retries")]
    pub retries: u32,

    #[serde(default = "default_excerpt_max_chars")]
    pub excerpt_max_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeSection {
    #[serde(default = "default_call_to_action")]
    pub call_to_action: String,

    #[serde(default = "default_message_max_chars")]
    pub max_chars: usize,
}

// Default value functions
fn default_ledger_db_path() -> PathBuf {
    PathBuf::from("./ledger.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval() -> u64 {
    30
}

fn default_fetch_page_size() -> u32 {
    10
}

fn default_max_per_cycle() -> usize {
    3
}

fn default_source_api_key_env() -> String {
    "SOURCE_API_KEY".to_string()
}

fn default_bot_token_env() -> String {
    "MESSAGING_BOT_TOKEN".to_string()
}

fn default_enrich_provider() -> String {
    "template".to_string()
}

fn default_enrich_api_key_env() -> String {
    "ENRICH_API_KEY".to_string()
}

fn default_enrich_timeout() -> u64 {
    30
}

fn default_enrich_retries() -> u32 {
    2
}

fn default_excerpt_max_chars() -> usize {
    200
}

fn default_call_to_action() -> String {
    "Read the full post:".to_string()
}

fn default_message_max_chars() -> usize {
    1024
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            ledger_db_path: default_ledger_db_path(),
            log_level: default_log_level(),
            poll_interval_secs: default_poll_interval(),
            fetch_page_size: default_fetch_page_size(),
            max_per_cycle: default_max_per_cycle(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_source_api_key_env(),
            feed_id: None,
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            bot_token_env: default_bot_token_env(),
            channel_id: None,
        }
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            provider: default_enrich_provider(),
            base_url: String::new(),
            api_key_env: default_enrich_api_key_env(),
            timeout_secs: default_enrich_timeout(),
            retries: default_enrich_retries(),
            excerpt_max_chars: default_excerpt_max_chars(),
        }
    }
}

impl Default for ComposeSection {
    fn default() -> Self {
        Self {
            call_to_action: default_call_to_action(),
            max_chars: default_message_max_chars(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("FEED_COURIER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# feed-courier configuration

[general]
ledger_db_path = "./ledger.sqlite"
log_level = "info"
poll_interval_secs = 30
fetch_page_size = 10
max_per_cycle = 3

[source]
# Env var holding the feed API key
api_key_env = "SOURCE_API_KEY"
# feed_id = "1234567890"

[messaging]
# Env var holding the bot token
bot_token_env = "MESSAGING_BOT_TOKEN"
# channel_id = "@my_channel"

[enrich]
provider = "template"  # template, remote, stub
# base_url = "https://caption-provider.example.com"
api_key_env = "ENRICH_API_KEY"
timeout_secs = 30
retries = 2
excerpt_max_chars = 200

[compose]
call_to_action = "Read the full post:"
max_chars = 1024
"#
        .to_string()
    }
}
