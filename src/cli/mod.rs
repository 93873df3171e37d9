//! CLI module for oiwatch
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `serve` - Poll all sources and serve the read API
//! - `snapshot` - Poll until settled, print the snapshot, and exit
//! - `sources` - List configured sources with resolved URLs
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Poll with the default config and serve on 127.0.0.1:8700
//! oiwatch serve
//!
//! # One-shot view against a remote backend
//! oiwatch snapshot --api-url http://10.0.0.5:5000 --json
//!
//! # Generate shell completions
//! oiwatch completions bash > ~/.bash_completion.d/oiwatch
//! ```

pub mod completions;
pub mod config;
pub mod output;
pub mod serve;
pub mod snapshot;
pub mod sources;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// oiwatch - option-chain dashboard poller
#[derive(Parser, Debug)]
#[command(
    name = "oiwatch",
    version,
    about = "Multi-source poller for an option-chain market dashboard"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll every source and serve the read API
    Serve(ServeArgs),
    /// Poll until every source has settled, then print the snapshot
    Snapshot(SnapshotArgs),
    /// List configured sources
    Sources(SourcesArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "oiwatch.toml")]
    pub config: PathBuf,

    /// Override the analytics backend base URL
    #[arg(short = 'u', long, env = "OIWATCH_API_URL")]
    pub api_url: Option<String>,

    /// Override server port
    #[arg(short, long, env = "OIWATCH_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "OIWATCH_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "OIWATCH_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "oiwatch.toml")]
    pub config: PathBuf,

    /// Override the analytics backend base URL
    #[arg(short = 'u', long, env = "OIWATCH_API_URL")]
    pub api_url: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Seconds to wait for every source to settle
    #[arg(short, long, default_value = "90")]
    pub wait: u64,

    /// Set log level (defaults to warn so output stays readable)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct SourcesArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "oiwatch.toml")]
    pub config: PathBuf,

    /// Override the analytics backend base URL
    #[arg(short = 'u', long, env = "OIWATCH_API_URL")]
    pub api_url: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "oiwatch.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
