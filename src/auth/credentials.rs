//! Credential storage for the signed-in session.
//!
//! [`CredentialStore`] holds the access/refresh pair and the cached
//! identity in memory and mirrors them to a [`SessionStorage`] under the
//! keys `access`, `refresh` and `user`.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StorageError;
use crate::models::Identity;
use crate::traits::{SessionStorage, ACCESS_KEY, REFRESH_KEY, USER_KEY};

/// Access and refresh tokens of the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPair {
    /// Short-lived bearer token attached to requests.
    pub access_token: Option<String>,
    /// Longer-lived token used only to obtain new access tokens.
    pub refresh_token: Option<String>,
}

impl CredentialPair {
    pub fn new(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token,
            refresh_token,
        }
    }

    /// Check if an access token is present.
    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Check if both tokens are absent.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

#[derive(Debug, Default)]
struct Session {
    pair: CredentialPair,
    identity: Option<Identity>,
    /// Bumped whenever a session ends or a new one is established
    generation: u64,
}

/// Process-wide holder of the credential pair and cached identity.
///
/// Reads are synchronous and never fail. The `apply*`/`reset` methods
/// change only the in-memory state, so the refresh coordinator can update
/// credentials without a suspension point; `persist` mirrors the current
/// state to storage afterwards. `set`, `set_identity` and `clear` do both.
pub struct CredentialStore {
    session: RwLock<Session>,
    storage: Arc<dyn SessionStorage>,
    /// Serialises writes so storage converges to the latest snapshot
    persist_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pair = self.get();
        f.debug_struct("CredentialStore")
            .field("has_access_token", &pair.access_token.is_some())
            .field("has_refresh_token", &pair.refresh_token.is_some())
            .finish()
    }
}

impl CredentialStore {
    /// Create an empty store backed by `storage`. Nothing is read.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            session: RwLock::new(Session::default()),
            storage,
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Create a store seeded from what `storage` holds.
    ///
    /// A cached identity that no longer decodes is dropped.
    pub async fn load(storage: Arc<dyn SessionStorage>) -> Result<Self, StorageError> {
        let access_token = storage.load(ACCESS_KEY).await?;
        let refresh_token = storage.load(REFRESH_KEY).await?;
        let identity = match storage.load(USER_KEY).await? {
            Some(raw) => match serde_json::from_str::<Identity>(&raw) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    tracing::warn!("Dropping undecodable cached identity: {}", e);
                    None
                }
            },
            None => None,
        };

        tracing::debug!(
            has_access_token = access_token.is_some(),
            has_refresh_token = refresh_token.is_some(),
            "loaded stored credentials"
        );

        let store = Self::new(storage);
        {
            let mut session = store.write();
            session.pair = CredentialPair::new(access_token, refresh_token);
            session.identity = identity;
        }
        Ok(store)
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current credential pair.
    pub fn get(&self) -> CredentialPair {
        self.read().pair.clone()
    }

    /// Current access token.
    pub fn access_token(&self) -> Option<String> {
        self.read().pair.access_token.clone()
    }

    /// Cached identity of the signed-in user.
    pub fn identity(&self) -> Option<Identity> {
        self.read().identity.clone()
    }

    /// Counter identifying the current session.
    ///
    /// Changes on `establish`, `reset` and `clear`, never on `apply`.
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Replace the whole session with a freshly signed-in one, in memory only.
    pub fn establish(&self, access_token: &str, refresh_token: &str, identity: Option<Identity>) {
        let mut session = self.write();
        session.pair = CredentialPair::new(
            Some(access_token.to_string()),
            Some(refresh_token.to_string()),
        );
        session.identity = identity;
        session.generation += 1;
    }

    /// `apply` only if the session is still `generation`.
    ///
    /// Returns false and leaves the store alone when the session ended in
    /// the meantime.
    pub fn apply_if_current(
        &self,
        generation: u64,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> bool {
        let mut session = self.write();
        if session.generation != generation {
            return false;
        }
        Self::assign(&mut session, access_token, refresh_token);
        true
    }

    /// `reset` only if the session is still `generation`.
    pub fn reset_if_current(&self, generation: u64) -> bool {
        let mut session = self.write();
        if session.generation != generation {
            return false;
        }
        Self::end(&mut session);
        true
    }

    fn end(session: &mut Session) {
        session.pair = CredentialPair::default();
        session.identity = None;
        session.generation += 1;
    }

    /// Overwrite the fields that are provided, in memory only.
    pub fn apply(&self, access_token: Option<&str>, refresh_token: Option<&str>) {
        Self::assign(&mut self.write(), access_token, refresh_token);
    }

    fn assign(session: &mut Session, access_token: Option<&str>, refresh_token: Option<&str>) {
        if let Some(access) = access_token {
            session.pair.access_token = Some(access.to_string());
        }
        if let Some(refresh) = refresh_token {
            session.pair.refresh_token = Some(refresh.to_string());
        }
    }

    /// Replace the cached identity, in memory only.
    pub fn apply_identity(&self, identity: Option<Identity>) {
        self.write().identity = identity;
    }

    /// Drop both tokens and the identity, in memory only.
    pub fn reset(&self) {
        Self::end(&mut self.write());
    }

    /// Overwrite the provided fields and persist.
    pub async fn set(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<(), StorageError> {
        self.apply(access_token, refresh_token);
        self.persist().await
    }

    /// Replace the cached identity and persist.
    pub async fn set_identity(&self, identity: Option<Identity>) -> Result<(), StorageError> {
        self.apply_identity(identity);
        self.persist().await
    }

    /// Drop both tokens and the identity and persist.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.reset();
        self.persist().await
    }

    /// Write the current in-memory state to storage.
    pub async fn persist(&self) -> Result<(), StorageError> {
        let _guard = self.persist_lock.lock().await;

        // Snapshot after taking the lock so the last writer stores the latest state
        let (pair, identity) = {
            let session = self.read();
            (session.pair.clone(), session.identity.clone())
        };
        let user = identity
            .map(|identity| serde_json::to_string(&identity))
            .transpose()
            .map_err(|e| StorageError::WriteFailed(format!("Failed to encode identity: {}", e)))?;

        self.write_key(ACCESS_KEY, pair.access_token.as_deref()).await?;
        self.write_key(REFRESH_KEY, pair.refresh_token.as_deref()).await?;
        self.write_key(USER_KEY, user.as_deref()).await
    }

    async fn write_key(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        match value {
            Some(value) => self.storage.store(key, value).await,
            None => self.storage.remove(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::InMemoryStorage;

    fn identity() -> Identity {
        serde_json::from_str(r#"{"id": 1, "username": "ada"}"#).unwrap()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = CredentialStore::new(Arc::new(InMemoryStorage::new()));
        assert_eq!(store.get(), CredentialPair::default());
        assert!(store.get().is_empty());
        assert!(store.identity().is_none());
    }

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let storage = InMemoryStorage::new();
        let store = CredentialStore::new(Arc::new(storage.clone()));

        store.set(Some("a1"), Some("r1")).await.unwrap();

        assert_eq!(
            store.get(),
            CredentialPair::new(Some("a1".to_string()), Some("r1".to_string()))
        );
        assert_eq!(storage.entry(ACCESS_KEY), Some("a1".to_string()));
        assert_eq!(storage.entry(REFRESH_KEY), Some("r1".to_string()));
    }

    #[tokio::test]
    async fn test_set_keeps_fields_not_provided() {
        let store = CredentialStore::new(Arc::new(InMemoryStorage::new()));
        store.set(Some("a1"), Some("r1")).await.unwrap();

        store.set(Some("a2"), None).await.unwrap();

        assert_eq!(store.access_token(), Some("a2".to_string()));
        assert_eq!(store.get().refresh_token, Some("r1".to_string()));
    }

    #[tokio::test]
    async fn test_clear_resets_everything() {
        let storage = InMemoryStorage::new();
        let store = CredentialStore::new(Arc::new(storage.clone()));
        store.set(Some("a1"), Some("r1")).await.unwrap();
        store.set_identity(Some(identity())).await.unwrap();
        assert!(storage.entry(USER_KEY).is_some());

        store.clear().await.unwrap();

        assert_eq!(store.get(), CredentialPair::new(None, None));
        assert!(store.identity().is_none());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_load_seeds_from_storage() {
        let user = serde_json::to_string(&identity()).unwrap();
        let storage = InMemoryStorage::with_entries([
            (ACCESS_KEY, "a1"),
            (REFRESH_KEY, "r1"),
            (USER_KEY, user.as_str()),
        ]);

        let store = CredentialStore::load(Arc::new(storage)).await.unwrap();

        assert_eq!(store.access_token(), Some("a1".to_string()));
        assert_eq!(store.get().refresh_token, Some("r1".to_string()));
        assert_eq!(store.identity(), Some(identity()));
    }

    #[tokio::test]
    async fn test_load_drops_corrupt_identity() {
        let storage = InMemoryStorage::with_entries([(ACCESS_KEY, "a1"), (USER_KEY, "{not json")]);

        let store = CredentialStore::load(Arc::new(storage)).await.unwrap();

        assert_eq!(store.access_token(), Some("a1".to_string()));
        assert!(store.identity().is_none());
    }

    #[tokio::test]
    async fn test_load_propagates_read_failure() {
        let storage = InMemoryStorage::new();
        storage.set_load_should_fail(true);

        let result = CredentialStore::load(Arc::new(storage)).await;
        assert!(matches!(result, Err(StorageError::ReadFailed(_))));
    }

    #[tokio::test]
    async fn test_apply_does_not_touch_storage_until_persist() {
        let storage = InMemoryStorage::new();
        let store = CredentialStore::new(Arc::new(storage.clone()));

        store.apply(Some("a1"), Some("r1"));
        assert!(storage.is_empty());

        store.persist().await.unwrap();
        assert_eq!(storage.entry(ACCESS_KEY), Some("a1".to_string()));
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_memory_state() {
        let storage = InMemoryStorage::new();
        storage.set_write_should_fail(true);
        let store = CredentialStore::new(Arc::new(storage));

        let result = store.set(Some("a1"), None).await;

        assert!(matches!(result, Err(StorageError::WriteFailed(_))));
        assert_eq!(store.access_token(), Some("a1".to_string()));
    }

    #[test]
    fn test_stale_generation_cannot_revive_session() {
        let store = CredentialStore::new(Arc::new(InMemoryStorage::new()));
        store.establish("a1", "r1", Some(identity()));
        let started = store.generation();

        store.reset();

        assert!(!store.apply_if_current(started, Some("a2"), None));
        assert!(!store.reset_if_current(started));
        assert!(store.get().is_empty());
        assert!(store.identity().is_none());
    }

    #[test]
    fn test_current_generation_applies() {
        let store = CredentialStore::new(Arc::new(InMemoryStorage::new()));
        store.establish("a1", "r1", None);
        let started = store.generation();

        store.apply(Some("a-unrelated"), None);
        assert_eq!(store.generation(), started);

        assert!(store.apply_if_current(started, Some("a2"), None));
        assert_eq!(
            store.get(),
            CredentialPair::new(Some("a2".to_string()), Some("r1".to_string()))
        );
        assert!(store.reset_if_current(started));
        assert_ne!(store.generation(), started);
    }

    #[test]
    fn test_debug_does_not_leak_tokens() {
        let store = CredentialStore::new(Arc::new(InMemoryStorage::new()));
        store.apply(Some("secret-access"), None);
        let debug = format!("{:?}", store);
        assert!(!debug.contains("secret-access"));
        assert!(debug.contains("has_access_token: true"));
    }
}
