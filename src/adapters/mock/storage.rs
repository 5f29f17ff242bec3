//! In-memory session storage for testing.
//!
//! Provides a [`SessionStorage`] that keeps its entries in memory,
//! suitable for testing without file system access.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::StorageError;
use crate::traits::SessionStorage;

/// In-memory session storage for testing.
///
/// Clones share the same entries, so a test can keep a handle and inspect
/// what the client persisted.
///
/// # Example
///
/// ```ignore
/// use sessionkit::adapters::mock::InMemoryStorage;
/// use sessionkit::traits::{SessionStorage, ACCESS_KEY};
///
/// let storage = InMemoryStorage::new();
/// storage.store(ACCESS_KEY, "token").await?;
/// assert_eq!(storage.entry(ACCESS_KEY), Some("token".to_string()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
    /// Whether writes and removals should fail
    write_should_fail: Arc<Mutex<bool>>,
    /// Whether reads should fail
    load_should_fail: Arc<Mutex<bool>>,
}

impl InMemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with entries.
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let storage = Self::new();
        {
            let mut map = storage.entries.lock().unwrap();
            for (key, value) in entries {
                map.insert(key.to_string(), value.to_string());
            }
        }
        storage
    }

    /// Configure whether store/remove should fail.
    pub fn set_write_should_fail(&self, should_fail: bool) {
        *self.write_should_fail.lock().unwrap() = should_fail;
    }

    /// Configure whether load should fail.
    pub fn set_load_should_fail(&self, should_fail: bool) {
        *self.load_should_fail.lock().unwrap() = should_fail;
    }

    /// Get an entry synchronously (for assertions).
    pub fn entry(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStorage for InMemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        if *self.load_should_fail.lock().unwrap() {
            return Err(StorageError::ReadFailed("Mock load failure".to_string()));
        }
        Ok(self.entry(key))
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if *self.write_should_fail.lock().unwrap() {
            return Err(StorageError::WriteFailed("Mock write failure".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        if *self.write_should_fail.lock().unwrap() {
            return Err(StorageError::WriteFailed("Mock write failure".to_string()));
        }
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
