//! radiosync - keeps a local copy of the radio station catalog in step with
//! its published remote copy, and manages favorites and playback preferences.

mod cli;
mod commands;
mod error;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use radiosync_core::AppConfig;
use tracing::{Level, error, info};

use crate::cli::Cli;
use crate::commands::AppState;
use crate::error::Result;
use crate::logging::LoggingConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logging_config = LoggingConfig::auto();
    if cli.verbose {
        logging_config = logging_config.with_console_level(Level::DEBUG);
    }
    // Logging is best effort; the command still runs without it
    let _guard = match logging::init(&logging_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: {e}");
            None
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    info!(
        "Starting radiosync (remote: {}, data: {})",
        config.remote_url,
        config.data_directory.display()
    );

    let state = AppState::new(config);
    let mut stdout = std::io::stdout().lock();
    state.run(cli.command, &mut stdout).await
}

/// Load the config file and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load()?;
    if let Some(url) = &cli.url {
        config.remote_url.clone_from(url);
    }
    if let Some(dir) = &cli.data_dir {
        config.data_directory.clone_from(dir);
    }
    if let Some(timeout) = cli.timeout {
        config.fetch_timeout_secs = timeout;
    }
    config.validate()?;
    Ok(config)
}
