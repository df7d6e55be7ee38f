//! Application configuration management.
//!
//! Handles loading and saving the settings the sync subsystem needs: the
//! remote catalog URL, the data directory holding the cache and stores, and
//! the fetch timeout.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, FileSystemError, Result};
use crate::fetch::DEFAULT_FETCH_TIMEOUT_SECS;

/// Default location of the published station catalog.
pub const DEFAULT_REMOTE_URL: &str =
    "https://raw.githubusercontent.com/kadir133/radioApp/refs/heads/main/radio_stations.json";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// URL of the remote station catalog.
    #[serde(default = "default_remote_url")]
    pub remote_url: String,
    /// Directory holding the catalog cache and key-value stores.
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    /// Timeout for the remote catalog request, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_remote_url() -> String {
    DEFAULT_REMOTE_URL.to_string()
}

const fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote_url: default_remote_url(),
            data_directory: default_data_directory(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, or create defaults if
    /// not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`, writing defaults there if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found, using defaults");
            let config = Self::default();
            if let Err(e) = config.save_to(path) {
                warn!("Failed to save default config: {}", e);
            }
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::FileSystem(FileSystemError::ReadFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to read config file: {e}"),
            })
        })?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {e}")))?;
        config.validate()?;

        info!("Loaded config from {}", path.display());
        debug!(
            "Remote catalog: {}, data directory: {}",
            config.remote_url,
            config.data_directory.display()
        );

        Ok(config)
    }

    /// Save configuration to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::FileSystem(FileSystemError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    reason: format!("Failed to create config directory: {e}"),
                })
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            Error::FileSystem(FileSystemError::WriteFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to write config file: {e}"),
            })
        })?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Check the values are usable.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a non-HTTP URL or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if !(self.remote_url.starts_with("http://") || self.remote_url.starts_with("https://")) {
            return Err(Error::Configuration(format!(
                "Remote URL must use http or https: {}",
                self.remote_url
            )));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(Error::Configuration(
                "Fetch timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// The fetch timeout as a [`Duration`].
    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Get the path to the config file.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        config_file_path()
    }
}

/// Get the default data directory.
#[must_use]
pub fn default_data_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("radiosync")
}

/// Get the path to the config file.
fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("radiosync")
        .join("config.json")
}
