//! Session storage trait abstraction.
//!
//! The credential pair and cached identity survive restarts in a small
//! key-value store. Keys are the fixed names below.

use async_trait::async_trait;

use crate::error::StorageError;

/// Key holding the access token.
pub const ACCESS_KEY: &str = "access";

/// Key holding the refresh token.
pub const REFRESH_KEY: &str = "refresh";

/// Key holding the cached identity, serialised as JSON.
pub const USER_KEY: &str = "user";

/// Persistent key-value store for session state.
///
/// Implementations include the file-backed store used in production and an
/// in-memory store for tests.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Read a value.
    ///
    /// # Returns
    /// - `Ok(Some(value))` if the key is present
    /// - `Ok(None)` if it is absent
    /// - `Err(error)` if the store could not be read
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    async fn store(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
