//! Authenticated API client.
//!
//! [`ApiClient`] is the single entry point call-sites use to reach the
//! backend. Every request carries the current access token; a 401 is
//! recovered once through the shared [`RefreshCoordinator`].

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::adapters::{FileSessionStorage, ReqwestHttpClient};
use crate::auth::events::EVENT_CHANNEL_CAPACITY;
use crate::auth::{
    attach_bearer, authorize, CredentialPair, CredentialStore, RefreshCoordinator, SessionEvent,
    TokenApi,
};
use crate::config::ClientConfig;
use crate::dispatch::RequestDispatcher;
use crate::error::{ApiError, ApiResult};
use crate::models::{ApiRequest, Headers, Identity, Method};
use crate::traits::{HttpClient, Response, SessionStorage};

/// HTTP client that keeps a signed-in session alive.
///
/// # Example
///
/// ```ignore
/// use sessionkit::{ApiClient, ClientConfig};
///
/// let client = ApiClient::from_config(ClientConfig::from_env()?).await?;
/// client.login("ada", "secret").await?;
/// let feed = client.get("/posts/").await?;
/// ```
pub struct ApiClient {
    dispatcher: RequestDispatcher,
    credentials: Arc<CredentialStore>,
    tokens: TokenApi,
    coordinator: RefreshCoordinator,
    events: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.dispatcher.config().base_url)
            .field("credentials", &self.credentials)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

impl ApiClient {
    /// Create a client, seeding credentials from `storage`.
    pub async fn new(
        config: ClientConfig,
        http: Arc<dyn HttpClient>,
        storage: Arc<dyn SessionStorage>,
    ) -> ApiResult<Self> {
        config.validate()?;
        let credentials = Arc::new(CredentialStore::load(storage).await?);
        Ok(Self::with_credentials(config, http, credentials))
    }

    /// Create a client around an existing credential store.
    pub fn with_credentials(
        config: ClientConfig,
        http: Arc<dyn HttpClient>,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        let refresh_timeout = config.refresh_timeout;
        let dispatcher = RequestDispatcher::new(http, Arc::new(config));
        let tokens = TokenApi::new(dispatcher.clone());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let coordinator = RefreshCoordinator::new(
            Arc::clone(&credentials),
            tokens.clone(),
            refresh_timeout,
            events.clone(),
        );

        Self {
            dispatcher,
            credentials,
            tokens,
            coordinator,
            events,
        }
    }

    /// Create a client with the reqwest transport and file storage.
    pub async fn from_config(config: ClientConfig) -> ApiResult<Self> {
        let http = ReqwestHttpClient::with_timeout(config.request_timeout)?;
        let storage = match &config.storage_dir {
            Some(dir) => FileSessionStorage::in_dir(dir),
            None => FileSessionStorage::new()?,
        };
        tracing::debug!(base_url = %config.base_url, session_file = %storage.path().display(), "creating API client");
        Self::new(config, Arc::new(http), Arc::new(storage)).await
    }

    /// Create a client configured from the environment.
    pub async fn from_env() -> ApiResult<Self> {
        Self::from_config(ClientConfig::from_env()?).await
    }

    pub fn config(&self) -> &ClientConfig {
        self.dispatcher.config()
    }

    /// Current credential pair.
    pub fn credentials(&self) -> CredentialPair {
        self.credentials.get()
    }

    pub fn credential_store(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Cached identity of the signed-in user.
    pub fn identity(&self) -> Option<Identity> {
        self.credentials.identity()
    }

    /// Whether an access token is held.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.get().has_token()
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Receive session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Send a request with the session credential attached.
    pub async fn authenticated_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<Headers>,
    ) -> ApiResult<Response> {
        let mut request = ApiRequest::new(method, path);
        if let Some(body) = body {
            request = request.with_body(body);
        }
        if let Some(headers) = headers {
            request = request.with_headers(headers);
        }
        self.execute(request).await
    }

    /// Send `request`, recovering once from a stale access token.
    ///
    /// Anything but a 401 is returned as the dispatcher produced it. A 401
    /// on a request that may still be retried waits for a fresh token and
    /// replays the request once; the replay's outcome is returned as is.
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<Response> {
        let snapshot = self.credentials.get();
        let result = self
            .dispatcher
            .send(&authorize(request.clone(), &snapshot))
            .await;

        match result {
            Err(e) if e.is_unauthorized() && request.can_retry() => {
                tracing::debug!(
                    request_id = %request.id,
                    path = %request.path,
                    "access token rejected, waiting for refresh"
                );
                let token = self
                    .coordinator
                    .await_fresh_token(request.id, snapshot.access_token.as_deref())
                    .await?;
                let replay = attach_bearer(request.retried(), Some(&token));
                self.dispatcher.send(&replay).await
            }
            other => other,
        }
    }

    pub async fn get(&self, path: &str) -> ApiResult<Response> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> ApiResult<Response> {
        self.execute(ApiRequest::post(path, body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> ApiResult<Response> {
        self.execute(ApiRequest::new(Method::Put, path).with_body(body))
            .await
    }

    pub async fn patch(&self, path: &str, body: Value) -> ApiResult<Response> {
        self.execute(ApiRequest::new(Method::Patch, path).with_body(body))
            .await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<Response> {
        self.execute(ApiRequest::new(Method::Delete, path)).await
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.get(path).await?;
        response
            .json()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Sign in and store the returned credentials and identity.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<Option<Identity>> {
        let login = self.tokens.login(username, password).await?;

        self.credentials
            .establish(&login.access, &login.refresh, login.user.clone());
        if let Err(e) = self.credentials.persist().await {
            tracing::warn!("Failed to persist credentials after login: {}", e);
        }

        tracing::info!(username = %username, "Signed in");
        let _ = self.events.send(SessionEvent::LoggedIn {
            username: login.user.as_ref().map(|user| user.username.clone()),
        });
        Ok(login.user)
    }

    /// Sign out.
    ///
    /// The refresh token is revoked server-side when possible. The revoke
    /// goes through [`execute`](Self::execute), so an expired access token
    /// is refreshed and the call replayed once. Local credentials are
    /// cleared regardless of the outcome.
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.credentials.get().refresh_token {
            let request = self.tokens.logout_request(&refresh_token);
            if let Err(e) = self.execute(request).await {
                tracing::warn!("Server-side logout failed: {}", e);
            }
        }

        if let Err(e) = self.credentials.clear().await {
            tracing::warn!("Failed to clear stored credentials: {}", e);
        }

        tracing::info!("Signed out");
        let _ = self.events.send(SessionEvent::LoggedOut);
    }
}
