//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// feed-courier: polls a blog feed and forwards new posts to a messaging channel
#[derive(Parser, Debug)]
#[command(name = "feed-courier")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the feed and deliver new posts
    Run(RunArgs),

    /// Show ledger totals and configuration state
    Status(StatusArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show readiness
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run a single sync cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Override the feed id for this run
    #[arg(long)]
    pub feed_id: Option<String>,

    /// Override the destination channel for this run
    #[arg(long)]
    pub channel_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Store a setting in the ledger (overrides process defaults)
    Set { key: String, value: String },

    /// Show a stored setting
    Get { key: String },

    /// List recognized settings and whether they resolve
    List,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
