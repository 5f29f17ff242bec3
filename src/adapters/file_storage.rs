//! File-based session storage adapter.
//!
//! Stores the session keys as one JSON object in
//! `~/.sessionkit/session.json`.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StorageError;
use crate::traits::SessionStorage;

/// The session directory name.
const SESSION_DIR: &str = ".sessionkit";

/// The session file name.
const SESSION_FILE: &str = "session.json";

type Entries = BTreeMap<String, String>;

/// File-backed [`SessionStorage`].
///
/// A missing or unreadable file behaves like an empty store, so a corrupt
/// file only costs the user a fresh sign-in.
///
/// # Example
///
/// ```ignore
/// use sessionkit::adapters::FileSessionStorage;
/// use sessionkit::traits::{SessionStorage, ACCESS_KEY};
///
/// let storage = FileSessionStorage::new()?;
/// storage.store(ACCESS_KEY, "eyJhbGciOi...").await?;
/// ```
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    /// Serialises read-modify-write cycles
    write_lock: Mutex<()>,
}

impl FileSessionStorage {
    /// Storage at the default location under the home directory.
    pub fn new() -> Result<Self, StorageError> {
        let home = dirs::home_dir().ok_or(StorageError::NoHomeDirectory)?;
        Ok(Self::at_path(home.join(SESSION_DIR).join(SESSION_FILE)))
    }

    /// Storage inside `dir`, using the default file name.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at_path(dir.as_ref().join(SESSION_FILE))
    }

    /// Storage at an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the path to the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Entries {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(_) => return Entries::new(),
        };

        match serde_json::from_reader(BufReader::new(file)) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Ignoring unreadable session file: {}", e);
                Entries::new()
            }
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        }

        let file =
            File::create(&self.path).map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, entries)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| StorageError::WriteFailed(e.to_string()))
    }

    fn update<F>(&self, apply: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Entries),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::WriteFailed("session file lock poisoned".to_string()))?;
        let mut entries = self.read_entries();
        apply(&mut entries);
        self.write_entries(&entries)
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_entries().remove(key))
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
