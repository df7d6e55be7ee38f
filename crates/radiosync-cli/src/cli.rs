//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Radio station catalog sync and local playback state.
#[derive(Debug, Parser)]
#[command(name = "radiosync", version)]
#[command(about = "Sync the radio station catalog and manage favorites and preferences")]
pub struct Cli {
    /// Override the remote catalog URL
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Override the data directory (cache and stores)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Override the fetch timeout, in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Verbose console logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands. Defaults to `sync`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the remote catalog, update the cache, and list the stations
    Sync {
        /// Print the catalog as JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
    /// List the cached catalog without touching the network
    Cached,
    /// Show cache metadata and stored preferences
    Status,
    /// Delete the cached catalog and its metadata
    Clear,
    /// Select a station as the current one
    Play {
        /// Station id
        id: i64,
    },
    /// Select the station after the current one
    Next,
    /// Select the station before the current one
    Previous,
    /// Show the station to resume with
    Resume,
    /// Manage favorite stations
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    /// Manage playback preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),
    /// Wait for a sleep timer to elapse (0 cancels)
    Sleep {
        /// Minutes until playback stops
        #[arg(value_parser = clap::value_parser!(u32).range(0..=1440))]
        minutes: u32,
    },
}

/// Favorites subcommands.
#[derive(Debug, Subcommand)]
pub enum FavoritesCommand {
    /// List favorite stations
    List,
    /// Mark a station as favorite
    Add {
        /// Station id
        id: i64,
    },
    /// Unmark a favorite station
    Remove {
        /// Station id
        id: i64,
    },
    /// Flip the favorite flag of a station
    Toggle {
        /// Station id
        id: i64,
    },
}

/// Preferences subcommands.
#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// Print all preferences
    Show,
    /// Set the playback volume (0-100)
    Volume {
        /// Volume level
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: u8,
    },
    /// Enable or disable auto-play on startup
    Autoplay {
        /// `on` or `off`
        #[arg(value_parser = parse_switch, action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on or off, got '{other}'")),
    }
}
