//! File system abstraction for testability.
//!
//! The cache blob and the JSON-backed key-value store both go through the
//! [`FileSystem`] trait so tests can swap in an in-memory implementation and
//! simulate read or write failures.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, FileSystemError, Result};

/// Converts an I/O error for read operations.
fn read_error(path: &Path, e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::NotFound {
        return Error::FileSystem(FileSystemError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Error::FileSystem(FileSystemError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Converts an I/O error for write operations.
fn write_error(path: &Path, e: io::Error) -> Error {
    Error::FileSystem(FileSystemError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Converts an I/O error for directory creation.
fn create_dir_error(path: &Path, e: io::Error) -> Error {
    Error::FileSystem(FileSystemError::CreateDirFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Converts an I/O error for delete operations.
fn delete_error(path: &Path, e: io::Error) -> Error {
    Error::FileSystem(FileSystemError::DeleteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Converts an I/O error for rename operations.
fn rename_error(from: &Path, to: &Path, e: io::Error) -> Error {
    Error::FileSystem(FileSystemError::RenameFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Path of the sibling file used to stage an atomic write.
#[must_use]
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Abstraction over file system operations for testability.
pub trait FileSystem: Send + Sync {
    /// Read a file's contents as a string.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write string contents to a file, creating it if it doesn't exist.
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove a file.
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Rename/move a file, replacing the destination.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Replace a file's contents so readers see either the old or the new
    /// contents, never a partial write.
    ///
    /// The default stages the contents in a sibling `.tmp` file and renames it
    /// over the target, removing the staging file on failure. It assumes a
    /// single writer; [`RealFileSystem`] stages in a unique file instead.
    fn write_atomic(&self, path: &Path, contents: &str) -> Result<()> {
        let staging = staging_path(path);
        if let Err(e) = self
            .write(&staging, contents)
            .and_then(|()| self.rename(&staging, path))
        {
            if self.exists(&staging) {
                let _ = self.remove_file(&staging);
            }
            return Err(e);
        }
        Ok(())
    }
}

/// Real file system implementation using std::fs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl RealFileSystem {
    /// Create a new real file system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| read_error(path, e))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| create_dir_error(parent, e))?;
        }
        fs::write(path, contents).map_err(|e| write_error(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| create_dir_error(path, e))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| delete_error(path, e))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).map_err(|e| rename_error(from, to, e))
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| create_dir_error(parent, e))?;
        }

        // Unique per writer; dropped (and deleted) on any early return
        let mut staging = NamedTempFile::new_in(parent).map_err(|e| write_error(path, e))?;
        staging
            .write_all(contents.as_bytes())
            .map_err(|e| write_error(staging.path(), e))?;
        staging
            .as_file()
            .sync_all()
            .map_err(|e| write_error(staging.path(), e))?;
        staging.persist(path).map_err(|e| {
            let from = e.file.path().to_path_buf();
            rename_error(&from, path, e.error)
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
pub mod mock {
    //! Mock file system for testing.

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, RwLock};

    /// In-memory mock file system with switchable failures.
    #[derive(Debug, Clone, Default)]
    pub struct MockFileSystem {
        files: Arc<RwLock<HashMap<PathBuf, String>>>,
        fail_reads: Arc<AtomicBool>,
        fail_writes: Arc<AtomicBool>,
        writes: Arc<AtomicUsize>,
    }

    impl MockFileSystem {
        /// Create a new empty mock file system.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a file with string contents.
        pub fn add_file(&self, path: impl AsRef<Path>, contents: &str) {
            self.files
                .write()
                .expect("lock poisoned")
                .insert(path.as_ref().to_path_buf(), contents.to_string());
        }

        /// Current contents of a file, if any.
        #[must_use]
        pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
            self.files
                .read()
                .expect("lock poisoned")
                .get(path.as_ref())
                .cloned()
        }

        /// Make every read fail with a permission error.
        pub fn fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        /// Make every write fail as if the disk were full.
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Number of successful writes (staging writes included).
        #[must_use]
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// Get all files in the mock filesystem.
        #[must_use]
        pub fn list_all_files(&self) -> Vec<PathBuf> {
            self.files
                .read()
                .expect("lock poisoned")
                .keys()
                .cloned()
                .collect()
        }
    }

    impl FileSystem for MockFileSystem {
        fn read_to_string(&self, path: &Path) -> Result<String> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(Error::FileSystem(FileSystemError::ReadFailed {
                    path: path.to_path_buf(),
                    reason: "permission denied".to_string(),
                }));
            }
            let files = self.files.read().expect("lock poisoned");
            files.get(path).cloned().ok_or_else(|| {
                Error::FileSystem(FileSystemError::NotFound {
                    path: path.to_path_buf(),
                })
            })
        }

        fn write(&self, path: &Path, contents: &str) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Error::FileSystem(FileSystemError::WriteFailed {
                    path: path.to_path_buf(),
                    reason: "no space left on device".to_string(),
                }));
            }
            self.add_file(path, contents);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.read().expect("lock poisoned").contains_key(path)
        }

        fn create_dir_all(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn remove_file(&self, path: &Path) -> Result<()> {
            let mut files = self.files.write().expect("lock poisoned");
            files.remove(path);
            Ok(())
        }

        fn rename(&self, from: &Path, to: &Path) -> Result<()> {
            let mut files = self.files.write().expect("lock poisoned");
            let contents = files.remove(from).ok_or_else(|| {
                Error::FileSystem(FileSystemError::NotFound {
                    path: from.to_path_buf(),
                })
            })?;
            files.insert(to.to_path_buf(), contents);
            Ok(())
        }
    }
}
