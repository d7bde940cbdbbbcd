//! The persisted login session: a username plus an opaque token.
//!
//! The token is a uniqueness stamp, not a security credential. Reads are
//! lenient about a missing token (older records predate token stamping) but
//! treat a missing username as corruption and clear the record.

use crate::storage::{Storage, SESSION_KEY};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Token substituted when a stored record carries none.
pub const PLACEHOLDER_TOKEN: &str = "temp_token";

/// Minimal persisted proof of login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub username: String,
    pub token: String,
}

/// Stamp a fresh session token.
pub fn new_token() -> String {
    format!("valid_token_{}", chrono::Utc::now().timestamp_millis())
}

pub struct SessionStore<S: Storage> {
    storage: S,
}

impl<S: Storage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the stored session. An unreadable or username-less record is
    /// removed and reported as absent; the caller never sees the corruption.
    /// Returns the record together with whether a corrupt record was cleared.
    pub fn load(&mut self) -> Result<LoadedSession> {
        let Some(raw) = self.storage.get(SESSION_KEY)? else {
            return Ok(LoadedSession::Absent);
        };

        let parsed: Option<serde_json::Value> = serde_json::from_str(&raw).ok();
        let username = parsed
            .as_ref()
            .and_then(|v| v.get("username"))
            .and_then(|v| v.as_str())
            .filter(|u| !u.is_empty())
            .map(String::from);

        match username {
            Some(username) => {
                let token = parsed
                    .as_ref()
                    .and_then(|v| v.get("token"))
                    .and_then(|v| v.as_str())
                    .filter(|t| !t.is_empty())
                    .unwrap_or(PLACEHOLDER_TOKEN)
                    .to_string();
                Ok(LoadedSession::Present(SessionRecord { username, token }))
            }
            None => {
                self.clear()?;
                Ok(LoadedSession::Corrupt)
            }
        }
    }

    pub fn save(&mut self, record: &SessionRecord) -> Result<()> {
        let raw = serde_json::to_string(record)?;
        self.storage.set(SESSION_KEY, &raw)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove(SESSION_KEY)
    }
}

/// Outcome of reading the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedSession {
    /// No record stored.
    Absent,
    /// A usable record.
    Present(SessionRecord),
    /// A record was stored but unusable; it has been cleared.
    Corrupt,
}

impl LoadedSession {
    pub fn record(self) -> Option<SessionRecord> {
        match self {
            Self::Present(record) => Some(record),
            _ => None,
        }
    }
}
