//! `radiosync` Core Library
//!
//! This crate provides the non-UI core of the radio streaming application:
//! - Station catalog synchronization with a remote source and a local cache
//! - Built-in fallback station list
//! - Favorites and playback preferences over a namespaced key-value store
//! - Application configuration management
//! - Sleep timer presets
//!
//! # Error Handling
//!
//! Fallible operations return [`Result`] with the crate [`Error`]. The catalog
//! sync is the exception: it never fails, it degrades. See [`sync`].
//!
//! ```rust,ignore
//! use radiosync_core::{AppConfig, ConfigSyncCache};
//!
//! let config = AppConfig::load()?;
//! let cache = ConfigSyncCache::from_config(&config);
//! let catalog = cache.get_radio_data_or_builtin();
//! ```

pub mod builtin;
pub mod config;
pub mod error;
pub mod favorites;
pub mod fetch;
pub mod fs;
pub mod model;
pub mod preferences;
pub mod sleep_timer;
pub mod store;
pub mod sync;

pub use builtin::{default_stations, fallback_config};
pub use config::{AppConfig, DEFAULT_REMOTE_URL, default_data_directory};
pub use error::{Error, FileSystemError, Result, StoreError, SyncError};
pub use favorites::{FAVORITES_NAMESPACE, FavoriteManager};
pub use fetch::{DEFAULT_FETCH_TIMEOUT_SECS, HttpFetcher, RemoteFetcher};
pub use fs::{FileSystem, RealFileSystem};
pub use model::{Category, RadioConfig, RadioStation};
pub use preferences::{DEFAULT_VOLUME, MAX_VOLUME, PreferencesManager, SETTINGS_NAMESPACE};
pub use sleep_timer::{SLEEP_TIMER_PRESETS, SleepTimer};
pub use store::{JsonFileStore, LocalStore, LocalStoreExt, MemoryStore};
pub use sync::{
    CACHE_FILE_NAME, ConfigSource, ConfigSyncCache, Decision, KEY_LAST_CHECK, KEY_LAST_VERSION,
    METADATA_NAMESPACE, SyncMetadata, SyncOutcome, decide,
};
