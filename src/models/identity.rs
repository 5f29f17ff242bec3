use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last-known profile of the signed-in user.
///
/// Cached next to the credentials for display only; never consulted for
/// authorization decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
}

impl Identity {
    /// Name suitable for display: full name when known, username otherwise.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.username.clone()
        } else {
            full
        }
    }
}
