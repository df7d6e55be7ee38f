//! Remote catalog synchronization with a local cache.
//!
//! [`ConfigSyncCache`] serves the station catalog using a fetch-or-serve-stale
//! policy:
//!
//! 1. Read the cached catalog (missing or malformed cache counts as absent).
//! 2. Fetch and parse the remote catalog (any failure counts as absent).
//! 3. Keep the remote copy only if it is strictly newer than the cached one.
//! 4. Persist the remote copy atomically when it wins, then update the
//!    `last_version` / `last_check` metadata record.
//!
//! | cached  | remote  | remote newer | result | persist |
//! |---------|---------|--------------|--------|---------|
//! | absent  | absent  | -            | absent | no      |
//! | absent  | present | -            | remote | yes     |
//! | present | absent  | -            | cached | no      |
//! | present | present | yes          | remote | yes     |
//! | present | present | no / equal   | cached | no      |
//!
//! No step ever fails the call. Failures are logged and collected in the
//! returned [`SyncOutcome`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use radiosync_core::{ConfigSyncCache, HttpFetcher, JsonFileStore};
//!
//! let data_dir = std::path::PathBuf::from("/var/lib/radiosync");
//! let cache = ConfigSyncCache::new(
//!     &data_dir,
//!     Arc::new(HttpFetcher::new("https://example.com/radio_stations.json")),
//!     Arc::new(JsonFileStore::new(&data_dir, "radio_data")),
//! );
//!
//! let stations = cache.get_radio_data_or_builtin();
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::builtin;
use crate::config::AppConfig;
use crate::error::SyncError;
use crate::fetch::{HttpFetcher, RemoteFetcher};
use crate::fs::{FileSystem, RealFileSystem};
use crate::model::RadioConfig;
use crate::store::{JsonFileStore, LocalStore, LocalStoreExt};

/// File name of the cached catalog inside the data directory.
pub const CACHE_FILE_NAME: &str = "radios_cache.json";

/// Namespace of the sync metadata record.
pub const METADATA_NAMESPACE: &str = "radio_data";

/// Metadata key holding the version of the last persisted catalog.
pub const KEY_LAST_VERSION: &str = "last_version";

/// Metadata key holding the time of the last persist (Unix epoch millis).
pub const KEY_LAST_CHECK: &str = "last_check";

/// Where the catalog returned by a sync came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Freshly fetched remote catalog.
    Remote,
    /// Previously cached catalog.
    Cache,
    /// Neither source produced a catalog.
    Unavailable,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Cache => write!(f, "cache"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Result of comparing the cached and remote catalogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Catalog to serve.
    pub config: Option<RadioConfig>,
    /// Where it came from.
    pub source: ConfigSource,
    /// Whether it must be written to the cache.
    pub persist: bool,
}

/// Apply the version policy to the two inputs.
///
/// The remote catalog wins only when there is no cache or its version is
/// strictly greater. Equal versions keep the cached copy, even if the contents
/// differ.
#[must_use]
pub fn decide(cached: Option<RadioConfig>, remote: Option<RadioConfig>) -> Decision {
    match (cached, remote) {
        (None, None) => Decision {
            config: None,
            source: ConfigSource::Unavailable,
            persist: false,
        },
        (None, Some(remote)) => Decision {
            config: Some(remote),
            source: ConfigSource::Remote,
            persist: true,
        },
        (Some(cached), None) => Decision {
            config: Some(cached),
            source: ConfigSource::Cache,
            persist: false,
        },
        (Some(cached), Some(remote)) => {
            if remote.is_newer_than(&cached) {
                Decision {
                    config: Some(remote),
                    source: ConfigSource::Remote,
                    persist: true,
                }
            } else {
                Decision {
                    config: Some(cached),
                    source: ConfigSource::Cache,
                    persist: false,
                }
            }
        }
    }
}

/// Report of a single sync call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Catalog to serve, if any.
    pub config: Option<RadioConfig>,
    /// Where the catalog came from.
    pub source: ConfigSource,
    /// Whether the catalog blob was written to the cache.
    pub persisted: bool,
    /// Version found in the cache before the call.
    pub cached_version: Option<u64>,
    /// Version fetched from the remote source.
    pub remote_version: Option<u64>,
    /// Step failures that were recovered from.
    pub errors: Vec<SyncError>,
}

impl SyncOutcome {
    fn unavailable(errors: Vec<SyncError>) -> Self {
        Self {
            config: None,
            source: ConfigSource::Unavailable,
            persisted: false,
            cached_version: None,
            remote_version: None,
            errors,
        }
    }

    /// Returns true if any step failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Informational metadata about the last persisted catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncMetadata {
    /// Version of the last persisted catalog.
    pub last_version: Option<u64>,
    /// When it was persisted (Unix epoch millis).
    pub last_check: Option<u64>,
}

/// Fetch-or-serve-stale cache for the station catalog.
///
/// Every instance over the same cache file shares one lock, so at most one
/// read-decide-write sequence runs at a time for that file in this process.
#[derive(Clone)]
pub struct ConfigSyncCache {
    fs: Arc<dyn FileSystem>,
    fetcher: Arc<dyn RemoteFetcher>,
    metadata: Arc<dyn LocalStore>,
    cache_path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl ConfigSyncCache {
    /// Create a cache storing its catalog in `data_dir`.
    ///
    /// `metadata` should be scoped to [`METADATA_NAMESPACE`].
    pub fn new(
        data_dir: impl AsRef<Path>,
        fetcher: Arc<dyn RemoteFetcher>,
        metadata: Arc<dyn LocalStore>,
    ) -> Self {
        let cache_path = data_dir.as_ref().join(CACHE_FILE_NAME);
        Self {
            fs: Arc::new(RealFileSystem::new()),
            fetcher,
            metadata,
            lock: lock_for(&cache_path),
            cache_path,
        }
    }

    /// Build a cache from application configuration, using HTTP for the
    /// remote source and a JSON file store for the metadata record.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let fetcher = HttpFetcher::new(&config.remote_url).with_timeout(config.fetch_timeout());
        let metadata = JsonFileStore::new(&config.data_directory, METADATA_NAMESPACE);
        Self::new(&config.data_directory, Arc::new(fetcher), Arc::new(metadata))
    }

    /// Use a custom file system for the catalog blob.
    #[must_use]
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Path of the cached catalog.
    #[must_use]
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Get the catalog to serve, or `None` if neither the cache nor the remote
    /// source can provide one.
    ///
    /// Performs blocking I/O; see [`Self::get_radio_data_async`].
    pub fn get_radio_data(&self) -> Option<RadioConfig> {
        self.sync().config
    }

    /// Like [`Self::get_radio_data`], falling back to the built-in stations.
    pub fn get_radio_data_or_builtin(&self) -> RadioConfig {
        self.get_radio_data().unwrap_or_else(|| {
            info!("No catalog available, using built-in stations");
            builtin::fallback_config()
        })
    }

    /// Run one read-decide-write sequence and report what happened.
    pub fn sync(&self) -> SyncOutcome {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut errors = Vec::new();

        let cached = self.read_cache().unwrap_or_else(|e| {
            warn!("{}", e);
            errors.push(e);
            None
        });

        let remote = match self.fetch_remote() {
            Ok(remote) => Some(remote),
            Err(e) => {
                warn!("{}", e);
                errors.push(e);
                None
            }
        };

        let cached_version = cached.as_ref().map(|c| c.version);
        let remote_version = remote.as_ref().map(|c| c.version);
        let decision = decide(cached, remote);

        let mut persisted = false;
        if decision.persist
            && let Some(config) = &decision.config
        {
            info!(
                "New catalog version {} (cached: {:?}), updating cache",
                config.version, cached_version
            );
            match self.write_cache(config) {
                Ok(()) => persisted = true,
                Err(e) => {
                    error!("{}", e);
                    errors.push(e);
                }
            }
            if persisted && let Err(e) = self.write_metadata(config.version) {
                error!("{}", e);
                errors.push(e);
            }
        } else {
            debug!(
                "Serving {} catalog (cached: {:?}, remote: {:?})",
                decision.source, cached_version, remote_version
            );
        }

        SyncOutcome {
            config: decision.config,
            source: decision.source,
            persisted,
            cached_version,
            remote_version,
            errors,
        }
    }

    /// Run [`Self::sync`] on the blocking thread pool.
    ///
    /// Dropping the returned future abandons the result; the blocking job
    /// still completes under the lock, so the cache is never left half-written.
    pub async fn sync_async(&self) -> SyncOutcome {
        let this = self.clone();
        match tokio::task::spawn_blocking(move || this.sync()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Catalog sync task failed: {}", e);
                SyncOutcome::unavailable(Vec::new())
            }
        }
    }

    /// Async form of [`Self::get_radio_data`].
    pub async fn get_radio_data_async(&self) -> Option<RadioConfig> {
        self.sync_async().await.config
    }

    /// Read the cached catalog without touching the network.
    pub fn cached_config(&self) -> Option<RadioConfig> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_cache().unwrap_or_else(|e| {
            warn!("{}", e);
            None
        })
    }

    /// Read the metadata record. Unreadable fields are reported as absent.
    pub fn metadata(&self) -> SyncMetadata {
        SyncMetadata {
            last_version: self
                .metadata
                .get_parsed(KEY_LAST_VERSION)
                .unwrap_or_default(),
            last_check: self
                .metadata
                .get_parsed(KEY_LAST_CHECK)
                .unwrap_or_default(),
        }
    }

    /// Delete the cached catalog and its metadata.
    ///
    /// This is the only way the persisted version can go down.
    pub fn clear(&self) -> crate::error::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.fs.exists(&self.cache_path) {
            self.fs.remove_file(&self.cache_path)?;
        }
        self.metadata.remove(KEY_LAST_VERSION)?;
        self.metadata.remove(KEY_LAST_CHECK)?;
        info!("Cleared catalog cache at {}", self.cache_path.display());
        Ok(())
    }

    fn read_cache(&self) -> Result<Option<RadioConfig>, SyncError> {
        let content = match self.fs.read_to_string(&self.cache_path) {
            Ok(content) => content,
            Err(e) if e.is_not_found() => {
                debug!("No cached catalog at {}", self.cache_path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(SyncError::CacheRead {
                    path: self.cache_path.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let config = RadioConfig::from_json(&content).map_err(|e| SyncError::CacheRead {
            path: self.cache_path.clone(),
            reason: format!("Malformed cache: {e}"),
        })?;
        debug!("Read cached catalog version {}", config.version);
        Ok(Some(config))
    }

    fn fetch_remote(&self) -> Result<RadioConfig, SyncError> {
        let body = self.fetcher.fetch()?;
        let config =
            RadioConfig::from_slice(&body).map_err(|e| SyncError::parse(e.to_string()))?;
        debug!("Fetched remote catalog version {}", config.version);
        Ok(config)
    }

    fn write_cache(&self, config: &RadioConfig) -> Result<(), SyncError> {
        let write_error = |reason: String| SyncError::CacheWrite {
            path: self.cache_path.clone(),
            reason,
        };

        let content = config.to_json().map_err(|e| write_error(e.to_string()))?;
        if let Some(parent) = self.cache_path.parent()
            && !parent.as_os_str().is_empty()
        {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| write_error(e.to_string()))?;
        }
        self.fs
            .write_atomic(&self.cache_path, &content)
            .map_err(|e| write_error(e.to_string()))?;

        info!("Cache updated to version {}", config.version);
        Ok(())
    }

    fn write_metadata(&self, version: u64) -> Result<(), SyncError> {
        let write_error = |reason: String| SyncError::CacheWrite {
            path: self.cache_path.clone(),
            reason: format!("Failed to update metadata: {reason}"),
        };

        self.metadata
            .set_display(KEY_LAST_VERSION, &version)
            .map_err(|e| write_error(e.to_string()))?;
        self.metadata
            .set_display(KEY_LAST_CHECK, &now_millis())
            .map_err(|e| write_error(e.to_string()))
    }
}

impl std::fmt::Debug for ConfigSyncCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSyncCache")
            .field("cache_path", &self.cache_path)
            .finish_non_exhaustive()
    }
}

/// The lock guarding `cache_path`, shared by every instance in the process.
fn lock_for(cache_path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

    let key = std::path::absolute(cache_path).unwrap_or_else(|_| cache_path.to_path_buf());
    let mut locks = LOCKS
        .get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    locks.entry(key).or_default().clone()
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::fetch::MockRemoteFetcher;
    use crate::fs::mock::MockFileSystem;
    use crate::model::{Category, RadioStation};
    use crate::store::{MemoryStore, MockLocalStore};
    use crate::error::StoreError;

    const DATA_DIR: &str = "/data";

    fn catalog(version: u64) -> RadioConfig {
        RadioConfig {
            version,
            last_updated: format!("2025-01-{version:02}"),
            categories: vec![Category {
                id: 1,
                name: "Pop".to_string(),
                icon: "ic_pop".to_string(),
                stations: vec![
                    RadioStation::new(10, "Kral Pop", "http://a/stream").with_description("Pop"),
                ],
            }],
        }
    }

    fn fetcher_returning(config: Option<RadioConfig>) -> MockRemoteFetcher {
        let mut fetcher = MockRemoteFetcher::new();
        fetcher.expect_fetch().returning(move || match &config {
            Some(c) => Ok(c.to_json().unwrap().into_bytes()),
            None => Err(SyncError::fetch("http://remote", "timed out after 10s")),
        });
        fetcher
    }

    struct Fixture {
        fs: MockFileSystem,
        store: Arc<MemoryStore>,
        cache: ConfigSyncCache,
    }

    impl Fixture {
        fn new(cached: Option<RadioConfig>, fetcher: MockRemoteFetcher) -> Self {
            let fs = MockFileSystem::new();
            let store = Arc::new(MemoryStore::new());
            let cache = ConfigSyncCache::new(DATA_DIR, Arc::new(fetcher), store.clone())
                .with_file_system(Arc::new(fs.clone()));
            if let Some(cached) = cached {
                fs.add_file(cache.cache_path(), &cached.to_json().unwrap());
            }
            Self { fs, store, cache }
        }

        fn persisted(&self) -> Option<RadioConfig> {
            self.fs
                .contents(self.cache.cache_path())
                .map(|json| RadioConfig::from_json(&json).unwrap())
        }
    }

    // =========================================================================
    // Decision table
    // =========================================================================

    #[test]
    fn test_decide_both_absent() {
        let d = decide(None, None);
        assert_eq!(d.config, None);
        assert_eq!(d.source, ConfigSource::Unavailable);
        assert!(!d.persist);
    }

    #[test]
    fn test_decide_remote_only() {
        let d = decide(None, Some(catalog(1)));
        assert_eq!(d.config, Some(catalog(1)));
        assert_eq!(d.source, ConfigSource::Remote);
        assert!(d.persist);
    }

    #[test]
    fn test_decide_cache_only() {
        let d = decide(Some(catalog(4)), None);
        assert_eq!(d.config, Some(catalog(4)));
        assert_eq!(d.source, ConfigSource::Cache);
        assert!(!d.persist);
    }

    #[test]
    fn test_decide_remote_newer() {
        let d = decide(Some(catalog(2)), Some(catalog(4)));
        assert_eq!(d.config.map(|c| c.version), Some(4));
        assert!(d.persist);
    }

    #[test]
    fn test_decide_remote_older_never_regresses() {
        let d = decide(Some(catalog(5)), Some(catalog(3)));
        assert_eq!(d.config.map(|c| c.version), Some(5));
        assert_eq!(d.source, ConfigSource::Cache);
        assert!(!d.persist);
    }

    #[test]
    fn test_decide_equal_version_keeps_cached_content() {
        let cached = catalog(3);
        let mut remote = catalog(3);
        remote.categories[0].stations[0].description = "Changed".to_string();

        let d = decide(Some(cached.clone()), Some(remote));
        assert_eq!(d.config, Some(cached));
        assert!(!d.persist);
    }

    #[test]
    fn test_decide_grid() {
        let versions = [None, Some(0_u64), Some(1), Some(5)];
        for cached in versions {
            for remote in versions {
                let d = decide(cached.map(catalog), remote.map(catalog));
                let expected = match (cached, remote) {
                    (_, Some(r)) if cached.is_none_or(|c| r > c) => (remote, true),
                    _ => (cached, false),
                };
                assert_eq!(d.config.map(|c| c.version), expected.0);
                assert_eq!(d.persist, expected.1, "cached={cached:?} remote={remote:?}");
            }
        }
    }

    // =========================================================================
    // Sync behavior
    // =========================================================================

    #[test]
    fn test_sync_first_run_persists_remote() {
        let fixture = Fixture::new(None, fetcher_returning(Some(catalog(1))));

        let outcome = fixture.cache.sync();

        assert_eq!(outcome.config, Some(catalog(1)));
        assert_eq!(outcome.source, ConfigSource::Remote);
        assert!(outcome.persisted);
        assert!(outcome.errors.is_empty());
        assert_eq!(fixture.persisted(), Some(catalog(1)));
        assert_eq!(fixture.cache.metadata().last_version, Some(1));
        assert!(fixture.cache.metadata().last_check.is_some());
    }

    #[test]
    fn test_sync_fetch_failure_serves_cache() {
        let fixture = Fixture::new(Some(catalog(5)), fetcher_returning(None));

        let outcome = fixture.cache.sync();

        assert_eq!(outcome.config, Some(catalog(5)));
        assert_eq!(outcome.source, ConfigSource::Cache);
        assert!(!outcome.persisted);
        assert!(matches!(outcome.errors.as_slice(), [SyncError::Fetch { .. }]));
        assert_eq!(fixture.fs.write_count(), 0);
    }

    #[test]
    fn test_sync_cache_read_failure_uses_remote() {
        let fixture = Fixture::new(Some(catalog(2)), fetcher_returning(Some(catalog(2))));
        fixture.fs.fail_reads(true);

        let outcome = fixture.cache.sync();

        assert_eq!(outcome.config.map(|c| c.version), Some(2));
        assert!(outcome.persisted);
        assert_eq!(outcome.cached_version, None);
        assert!(matches!(outcome.errors.as_slice(), [SyncError::CacheRead { .. }]));
    }

    #[test]
    fn test_sync_malformed_cache_counts_as_absent() {
        let fixture = Fixture::new(None, fetcher_returning(Some(catalog(3))));
        fixture.fs.add_file(fixture.cache.cache_path(), "{\"version\": ");

        let outcome = fixture.cache.sync();

        assert_eq!(outcome.source, ConfigSource::Remote);
        assert!(outcome.persisted);
        assert_eq!(fixture.persisted(), Some(catalog(3)));
    }

    #[test]
    fn test_sync_malformed_remote_is_parse_error() {
        let mut fetcher = MockRemoteFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|| Ok(b"<html>rate limited</html>".to_vec()));
        let fixture = Fixture::new(Some(catalog(2)), fetcher);

        let outcome = fixture.cache.sync();

        assert_eq!(outcome.config, Some(catalog(2)));
        assert!(!outcome.persisted);
        assert!(matches!(outcome.errors.as_slice(), [SyncError::Parse { .. }]));
    }

    #[test]
    fn test_sync_invalid_utf8_remote_is_parse_error() {
        let mut body = catalog(4).to_json().unwrap().into_bytes();
        let name_at = body
            .windows(8)
            .position(|w| w == b"Kral Pop")
            .unwrap();
        body[name_at + 4] = 0xFF;
        let mut fetcher = MockRemoteFetcher::new();
        fetcher.expect_fetch().returning(move || Ok(body.clone()));
        let fixture = Fixture::new(Some(catalog(2)), fetcher);

        let outcome = fixture.cache.sync();

        assert_eq!(outcome.config, Some(catalog(2)));
        assert_eq!(outcome.remote_version, None);
        assert!(!outcome.persisted);
        assert!(matches!(outcome.errors.as_slice(), [SyncError::Parse { .. }]));
        assert_eq!(fixture.persisted(), Some(catalog(2)));
    }

    #[test]
    fn test_sync_total_failure_is_absent() {
        let fixture = Fixture::new(None, fetcher_returning(None));
        fixture.fs.fail_reads(true);

        let outcome = fixture.cache.sync();

        assert_eq!(outcome.config, None);
        assert_eq!(outcome.source, ConfigSource::Unavailable);
        assert!(!outcome.persisted);
        assert_eq!(outcome.errors.len(), 2);
        assert!(fixture.cache.get_radio_data().is_none());
    }

    #[test]
    fn test_sync_write_failure_still_returns_remote() {
        let fixture = Fixture::new(Some(catalog(1)), fetcher_returning(Some(catalog(2))));
        fixture.fs.fail_writes(true);

        let outcome = fixture.cache.sync();

        assert_eq!(outcome.config.map(|c| c.version), Some(2));
        assert!(!outcome.persisted);
        assert!(matches!(outcome.errors.as_slice(), [SyncError::CacheWrite { .. }]));
        assert_eq!(fixture.persisted(), Some(catalog(1)));
        assert_eq!(fixture.cache.metadata().last_version, None);
    }

    #[test]
    fn test_sync_metadata_failure_is_reported() {
        let mut store = MockLocalStore::new();
        store.expect_set().returning(|_, _| {
            Err(StoreError::SaveFailed {
                namespace: METADATA_NAMESPACE.to_string(),
                reason: "read-only".to_string(),
            }
            .into())
        });
        let fs = MockFileSystem::new();
        let cache = ConfigSyncCache::new(
            DATA_DIR,
            Arc::new(fetcher_returning(Some(catalog(4)))),
            Arc::new(store),
        )
        .with_file_system(Arc::new(fs.clone()));

        let outcome = cache.sync();

        assert!(outcome.persisted);
        assert_eq!(outcome.config.map(|c| c.version), Some(4));
        assert!(matches!(outcome.errors.as_slice(), [SyncError::CacheWrite { .. }]));
    }

    #[test]
    fn test_sync_is_idempotent_on_unchanged_remote() {
        let fixture = Fixture::new(Some(catalog(2)), fetcher_returning(Some(catalog(4))));

        let first = fixture.cache.sync();
        let writes_after_first = fixture.fs.write_count();
        let second = fixture.cache.sync();

        assert!(first.persisted);
        assert!(!second.persisted);
        assert_eq!(second.source, ConfigSource::Cache);
        assert_eq!(second.config.map(|c| c.version), Some(4));
        assert_eq!(fixture.fs.write_count(), writes_after_first);
    }

    #[test]
    fn test_sync_fetches_every_call() {
        let mut fetcher = MockRemoteFetcher::new();
        fetcher
            .expect_fetch()
            .times(2)
            .returning(|| Ok(catalog(1).to_json().unwrap().into_bytes()));
        let fixture = Fixture::new(None, fetcher);

        fixture.cache.sync();
        fixture.cache.sync();
    }

    #[test]
    fn test_version_never_regresses_across_calls() {
        let versions = [3_u64, 1, 4, 4, 2, 6, 0, 5];
        let index = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut fetcher = MockRemoteFetcher::new();
        let counter = index.clone();
        fetcher.expect_fetch().returning(move || {
            let i = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(catalog(versions[i]).to_json().unwrap().into_bytes())
        });
        let fixture = Fixture::new(None, fetcher);

        let mut last_persisted = 0;
        for _ in versions {
            fixture.cache.sync();
            let persisted = fixture.persisted().map(|c| c.version).unwrap();
            assert!(persisted >= last_persisted);
            last_persisted = persisted;
        }
        assert_eq!(last_persisted, 6);
    }

    #[test]
    fn test_clear_removes_cache_and_metadata() {
        let fixture = Fixture::new(None, fetcher_returning(Some(catalog(9))));
        fixture.cache.sync();
        assert!(fixture.persisted().is_some());

        fixture.cache.clear().unwrap();

        assert!(fixture.persisted().is_none());
        assert_eq!(fixture.cache.metadata(), SyncMetadata::default());
        assert!(fixture.store.get(KEY_LAST_VERSION).unwrap().is_none());
    }

    #[test]
    fn test_cached_config_does_not_fetch() {
        let mut fetcher = MockRemoteFetcher::new();
        fetcher.expect_fetch().never();
        let fixture = Fixture::new(Some(catalog(3)), fetcher);

        assert_eq!(fixture.cache.cached_config(), Some(catalog(3)));
    }

    #[test]
    fn test_get_radio_data_or_builtin_falls_back() {
        let fixture = Fixture::new(None, fetcher_returning(None));
        let config = fixture.cache.get_radio_data_or_builtin();
        assert_eq!(config, builtin::fallback_config());
        assert!(fixture.persisted().is_none());
    }

    #[tokio::test]
    async fn test_sync_async_runs_off_thread() {
        let fixture = Fixture::new(Some(catalog(1)), fetcher_returning(Some(catalog(2))));

        let config = fixture.cache.get_radio_data_async().await;

        assert_eq!(config.map(|c| c.version), Some(2));
        assert_eq!(fixture.persisted().map(|c| c.version), Some(2));
    }

    #[test]
    fn test_concurrent_syncs_are_serialized() {
        let fixture = Fixture::new(None, fetcher_returning(Some(catalog(7))));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = fixture.cache.clone();
                std::thread::spawn(move || cache.sync())
            })
            .collect();
        let outcomes: Vec<SyncOutcome> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(outcomes.iter().filter(|o| o.persisted).count(), 1);
        assert!(outcomes.iter().all(|o| o.config.as_ref().map(|c| c.version) == Some(7)));
    }

    #[test]
    fn test_instances_over_one_file_share_a_lock() {
        let store = Arc::new(MemoryStore::new());
        let open = |dir: &str| {
            ConfigSyncCache::new(dir, Arc::new(MockRemoteFetcher::new()), store.clone())
        };
        let a = open("/data/a");
        let b = open("/data/a");
        let other = open("/data/b");

        assert!(Arc::ptr_eq(&a.lock, &b.lock));
        assert!(!Arc::ptr_eq(&a.lock, &other.lock));
    }

    #[test]
    fn test_independent_instances_never_regress() {
        const SHARED_DIR: &str = "/data/independent";
        let fs = MockFileSystem::new();
        let store = Arc::new(MemoryStore::named(METADATA_NAMESPACE));

        let mut slow = MockRemoteFetcher::new();
        slow.expect_fetch().returning(|| {
            std::thread::sleep(std::time::Duration::from_millis(300));
            Ok(catalog(3).to_json().unwrap().into_bytes())
        });
        let slow_cache = ConfigSyncCache::new(SHARED_DIR, Arc::new(slow), store.clone())
            .with_file_system(Arc::new(fs.clone()));
        let fast_fetcher = fetcher_returning(Some(catalog(5)));
        let fast_cache = ConfigSyncCache::new(SHARED_DIR, Arc::new(fast_fetcher), store)
            .with_file_system(Arc::new(fs.clone()));

        let slow_run = std::thread::spawn(move || slow_cache.sync());
        std::thread::sleep(std::time::Duration::from_millis(50));
        let fast = fast_cache.sync();
        let slow = slow_run.join().unwrap();

        assert_eq!(fast.config.map(|c| c.version), Some(5));
        assert!(slow.config.is_some());

        let on_disk = fs
            .contents(fast_cache.cache_path())
            .map(|json| RadioConfig::from_json(&json).unwrap().version);
        assert_eq!(on_disk, Some(5));
        assert_eq!(fast_cache.metadata().last_version, Some(5));
    }
}
