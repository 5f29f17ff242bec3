//! Single-flight token refresh.
//!
//! Every request that sees a 401 calls [`RefreshCoordinator::await_fresh_token`].
//! The first caller while idle starts the one refresh call; callers arriving
//! while it is in flight queue behind it. When the refresh settles, every
//! queued caller is resumed in arrival order with the same outcome.
//!
//! ```text
//!   Idle --(401, leader)--> Refreshing --(settled)--> Idle
//!                            |      ^
//!                            +------+ 401, follower: enqueue only
//! ```
//!
//! The phase check and the transition to `Refreshing` happen under one
//! lock with no await in between, so two callers can never both lead.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use uuid::Uuid;

use crate::auth::api::{RefreshResponse, TokenApi};
use crate::auth::credentials::CredentialStore;
use crate::auth::events::SessionEvent;
use crate::error::AuthError;

/// Outcome handed to each queued caller.
type Settlement = Result<String, AuthError>;

/// Reason given to waiters when logout or a new login overtook the refresh.
const SESSION_ENDED: &str = "session ended while the token was being refreshed";

/// Phase of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    /// No refresh in flight.
    Idle,
    /// One refresh call is in flight; new callers are queued.
    Refreshing,
}

/// A suspended caller waiting for the refresh to settle.
struct Waiter {
    request_id: Uuid,
    tx: oneshot::Sender<Settlement>,
}

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    /// Keyed by ticket, so iteration order is arrival order
    waiters: BTreeMap<u64, Waiter>,
    next_ticket: u64,
    refresh_count: u64,
}

impl RefreshState {
    fn phase(&self) -> RefreshPhase {
        if self.refreshing {
            RefreshPhase::Refreshing
        } else {
            RefreshPhase::Idle
        }
    }

    fn enqueue(&mut self, request_id: Uuid) -> (u64, oneshot::Receiver<Settlement>) {
        let (tx, rx) = oneshot::channel();
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.waiters.insert(ticket, Waiter { request_id, tx });
        (ticket, rx)
    }

    /// Return to idle and hand back every waiter in arrival order.
    fn drain(&mut self) -> Vec<Waiter> {
        self.refreshing = false;
        std::mem::take(&mut self.waiters).into_values().collect()
    }
}

struct Inner {
    state: Mutex<RefreshState>,
    credentials: Arc<CredentialStore>,
    api: TokenApi,
    refresh_timeout: Duration,
    events: broadcast::Sender<SessionEvent>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Perform the refresh call for session `generation` and settle every waiter.
    async fn run_refresh(self: Arc<Self>, generation: u64) {
        let outcome = match self.credentials.get().refresh_token {
            None => Err("no refresh token stored".to_string()),
            Some(refresh_token) => {
                match tokio::time::timeout(self.refresh_timeout, self.api.refresh(&refresh_token))
                    .await
                {
                    Ok(Ok(response)) => Ok(response),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!(
                        "refresh timed out after {}s",
                        self.refresh_timeout.as_secs_f64()
                    )),
                }
            }
        };
        self.settle(generation, outcome).await;
    }

    async fn settle(&self, generation: u64, outcome: Result<RefreshResponse, String>) {
        // Credentials and phase change together, before anyone is resumed
        let (settlement, waiters, current) = {
            let mut state = self.lock_state();
            let current = match &outcome {
                Ok(response) => self.credentials.apply_if_current(
                    generation,
                    Some(&response.access),
                    response.refresh.as_deref(),
                ),
                Err(_) => self.credentials.reset_if_current(generation),
            };
            let settlement = match (&outcome, current) {
                (_, false) => Err(AuthError::session_expired(SESSION_ENDED)),
                (Ok(response), true) => Ok(response.access.clone()),
                (Err(reason), true) => Err(AuthError::session_expired(reason.clone())),
            };
            (settlement, state.drain(), current)
        };

        if current {
            match &settlement {
                Ok(_) => tracing::info!(waiters = waiters.len(), "Access token refreshed"),
                Err(e) => tracing::warn!(waiters = waiters.len(), "Token refresh failed: {}", e),
            }

            if let Err(e) = self.credentials.persist().await {
                tracing::warn!("Failed to persist credentials after refresh: {}", e);
            }

            let event = match &settlement {
                Ok(_) => SessionEvent::Refreshed,
                Err(AuthError::SessionExpired { reason }) => SessionEvent::Expired {
                    reason: reason.clone(),
                },
                Err(e) => SessionEvent::Expired {
                    reason: e.to_string(),
                },
            };
            let _ = self.events.send(event);
        } else {
            // The session this refresh belonged to is gone; leave the store alone
            tracing::info!(
                waiters = waiters.len(),
                "Session ended during refresh, discarding result"
            );
        }

        for waiter in waiters {
            if waiter.tx.send(settlement.clone()).is_err() {
                tracing::trace!(request_id = %waiter.request_id, "waiter gone before settlement");
            }
        }
    }
}

/// Removes an abandoned caller from the queue.
struct WaiterGuard<'a> {
    inner: &'a Inner,
    ticket: u64,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.lock_state();
        if let Some(waiter) = state.waiters.remove(&self.ticket) {
            tracing::debug!(request_id = %waiter.request_id, "caller abandoned refresh wait");
        }
    }
}

/// Serialises token refreshes for one credential store.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock_state();
        f.debug_struct("RefreshCoordinator")
            .field("phase", &state.phase())
            .field("pending", &state.waiters.len())
            .field("refresh_count", &state.refresh_count)
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(
        credentials: Arc<CredentialStore>,
        api: TokenApi,
        refresh_timeout: Duration,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(RefreshState::default()),
                credentials,
                api,
                refresh_timeout,
                events,
            }),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RefreshPhase {
        self.inner.lock_state().phase()
    }

    /// Number of callers waiting on the in-flight refresh.
    pub fn pending(&self) -> usize {
        self.inner.lock_state().waiters.len()
    }

    /// Number of refresh calls started so far.
    pub fn refresh_count(&self) -> u64 {
        self.inner.lock_state().refresh_count
    }

    /// Wait for an access token that replaces `stale`.
    ///
    /// `stale` is the token the rejected request was sent with. If the store
    /// already holds a different token and no refresh is running, that token
    /// is returned without a new refresh. Otherwise the caller joins (or
    /// starts) the single in-flight refresh.
    ///
    /// On refresh failure the credentials are cleared and every caller gets
    /// [`AuthError::SessionExpired`]. Dropping the returned future removes
    /// the caller from the queue; the refresh itself keeps running.
    pub async fn await_fresh_token(
        &self,
        request_id: Uuid,
        stale: Option<&str>,
    ) -> Result<String, AuthError> {
        let (ticket, rx, lead) = {
            let mut state = self.inner.lock_state();
            if state.refreshing {
                let (ticket, rx) = state.enqueue(request_id);
                tracing::debug!(%request_id, queued = state.waiters.len(), "joined in-flight refresh");
                (ticket, rx, None)
            } else {
                if let Some(current) = self.inner.credentials.access_token() {
                    if stale != Some(current.as_str()) {
                        tracing::debug!(%request_id, "token already rotated, replaying");
                        return Ok(current);
                    }
                }
                state.refreshing = true;
                state.refresh_count += 1;
                let (ticket, rx) = state.enqueue(request_id);
                tracing::debug!(%request_id, "starting token refresh");
                (ticket, rx, Some(self.inner.credentials.generation()))
            }
        };

        let _guard = WaiterGuard {
            inner: &self.inner,
            ticket,
        };

        if let Some(generation) = lead {
            tokio::spawn(Arc::clone(&self.inner).run_refresh(generation));
        }

        match rx.await {
            Ok(settlement) => settlement,
            // Only reachable if the refresh task was torn down mid-flight
            Err(_) => Err(AuthError::session_expired("refresh task aborted")),
        }
    }
}
