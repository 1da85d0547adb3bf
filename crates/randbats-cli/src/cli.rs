use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "randbats", version, about = "Offline Pokemon random battle sets")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Cache directory (defaults to the user cache dir)
    #[arg(long, global = true, env = "RANDBATS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Never update automatically; serve whatever is cached
    #[arg(long, global = true)]
    pub offline: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Update random battle data
    Update {
        /// Format or alias to update (e.g. gen9randombattle, modern)
        #[arg(short, long = "format")]
        format: Option<String>,
        /// Update every known format
        #[arg(long, conflicts_with = "format")]
        all: bool,
        /// Download even if upstream reports no change
        #[arg(long)]
        force: bool,
    },
    /// Show a Pokemon's random battle set
    Get {
        name: String,
        /// Format to search in (auto-detected when omitted)
        #[arg(short, long = "format")]
        format: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List Pokemon in one or more formats
    List {
        /// Format or alias to list (all loaded formats when omitted)
        #[arg(short, long = "format")]
        format: Option<String>,
        /// Show only counts
        #[arg(long)]
        count: bool,
    },
    /// Show cache and data information
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show available formats and aliases
    Formats,
    /// Show probability stats for a Pokemon, or a format summary
    Stats {
        /// Pokemon name (omit with --summary)
        #[arg(required_unless_present = "summary")]
        name: Option<String>,
        #[arg(short, long = "format", default_value = "gen9randombattle")]
        format: String,
        /// Summarize stats coverage for the whole format
        #[arg(long)]
        summary: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show Smogon competitive sets for a Pokemon
    Sets {
        name: String,
        /// Smogon tier (e.g. gen9ou)
        #[arg(short, long = "format")]
        format: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download Smogon competitive sets
    UpdateSmogon {
        /// Tier to download (configured tiers, or all, when omitted)
        #[arg(short, long = "format")]
        format: Option<String>,
    },
    /// Search every loaded format for a Pokemon
    Search { name: String },
    /// Keep running and refresh data in the background
    Watch {
        /// Refresh once data is older than this many hours
        #[arg(long)]
        interval_hours: Option<u64>,
        /// How often to check freshness, in minutes
        #[arg(long, default_value = "10")]
        check_minutes: u64,
    },
    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
    /// Delete all cached data
    ClearCache,
}
