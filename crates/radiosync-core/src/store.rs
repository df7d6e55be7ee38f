//! Namespaced key-value storage.
//!
//! [`LocalStore`] is the small preferences-style capability used for the sync
//! metadata record, favorites and playback settings. Two implementations are
//! provided:
//! - [`JsonFileStore`]: one JSON object per namespace in the data directory
//! - [`MemoryStore`]: process-local, for tests and hosts without persistence

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::fs::{FileSystem, RealFileSystem};

/// A string key-value store scoped to one namespace.
#[cfg_attr(test, mockall::automock)]
pub trait LocalStore: Send + Sync {
    /// Namespace the keys live in.
    fn namespace(&self) -> &str;

    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed accessors on top of [`LocalStore`].
pub trait LocalStoreExt: LocalStore {
    /// Read a value and parse it.
    ///
    /// Returns `Ok(None)` if the key is missing and
    /// [`StoreError::InvalidValue`] if it cannot be parsed.
    fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(StoreError::InvalidValue {
                namespace: self.namespace().to_string(),
                key: key.to_string(),
                value: raw,
            }
            .into()),
        }
    }

    /// Read a value, falling back to `default` when it is missing, unreadable
    /// or unparseable.
    fn get_or<T: FromStr>(&self, key: &str, default: T) -> T {
        match self.get_parsed(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                warn!("Falling back to default for '{}': {}", key, e);
                default
            }
        }
    }

    /// Write any displayable value.
    fn set_display<T: ToString + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, &value.to_string())
    }
}

impl<S: LocalStore + ?Sized> LocalStoreExt for S {}

/// A [`LocalStore`] persisted as a flat JSON object in `<dir>/<namespace>.json`.
///
/// Every mutation rewrites the whole file atomically.
pub struct JsonFileStore {
    fs: Arc<dyn FileSystem>,
    namespace: String,
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store in `directory` on the real file system.
    pub fn new(directory: impl AsRef<Path>, namespace: impl Into<String>) -> Self {
        Self::with_file_system(Arc::new(RealFileSystem::new()), directory, namespace)
    }

    /// Open a store on a custom file system.
    pub fn with_file_system(
        fs: Arc<dyn FileSystem>,
        directory: impl AsRef<Path>,
        namespace: impl Into<String>,
    ) -> Self {
        let namespace = namespace.into();
        let path = directory.as_ref().join(format!("{namespace}.json"));
        Self {
            fs,
            namespace,
            path,
            lock: Mutex::new(()),
        }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        let content = match self.fs.read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.is_not_found() => {
                debug!("Store '{}' has no backing file yet", self.namespace);
                return Ok(BTreeMap::new());
            }
            Err(e) => {
                return Err(StoreError::LoadFailed {
                    namespace: self.namespace.clone(),
                    reason: e.to_string(),
                }
                .into());
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            StoreError::LoadFailed {
                namespace: self.namespace.clone(),
                reason: format!("Malformed store file: {e}"),
            }
            .into()
        })
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(values)?;
        self.fs.write_atomic(&self.path, &content).map_err(|e| {
            StoreError::SaveFailed {
                namespace: self.namespace.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load()?;
        f(&mut values);
        self.save(&values)
    }
}

impl LocalStore for JsonFileStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("namespace", &self.namespace)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Namespace of a [`MemoryStore`] created with [`MemoryStore::new`].
const MEMORY_NAMESPACE: &str = "memory";

/// A process-local [`LocalStore`].
#[derive(Debug)]
pub struct MemoryStore {
    namespace: String,
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::named(MEMORY_NAMESPACE)
    }

    /// Create an empty store with the given namespace.
    pub fn named(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStore for MemoryStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}
