//! Session lifecycle notifications.

/// Capacity of the session event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Change in the signed-in session, broadcast to subscribers.
///
/// `Expired` is the signal a UI should treat as a forced logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials were stored after a successful login.
    LoggedIn { username: Option<String> },
    /// The user signed out; credentials were cleared.
    LoggedOut,
    /// The access token was renewed transparently.
    Refreshed,
    /// A refresh failed; credentials were cleared.
    Expired { reason: String },
}

impl SessionEvent {
    /// Whether this event ends the session.
    pub fn ends_session(&self) -> bool {
        matches!(self, SessionEvent::LoggedOut | SessionEvent::Expired { .. })
    }
}
