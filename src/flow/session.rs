// ABOUTME: Authenticated session state with durable mirroring
// ABOUTME: Pluggable session stores; persisted only while validly authenticated
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Passlink Contributors

use crate::oauth2::TokenSet;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Session status, mirroring the flow machine for consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No session; initial and post-logout state
    Idle,
    /// An exchange is in flight
    Loading,
    /// A token set is held
    Authenticated,
    /// The last attempt failed
    Error,
}

/// The durable slice of an authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Token set issued by the authorization server
    pub tokens: TokenSet,
    /// Resolved local user id, when linking succeeded
    pub local_user_id: Option<Uuid>,
}

/// Durable per-browser/per-installation session persistence
pub trait SessionStore: Send + Sync {
    /// Persist a snapshot, replacing any previous one
    fn save(&self, snapshot: &SessionSnapshot) -> Result<()>;
    /// Load the stored snapshot, if any
    fn load(&self) -> Result<Option<SessionSnapshot>>;
    /// Remove any stored snapshot
    fn clear(&self) -> Result<()>;
}

/// In-memory session store
#[derive(Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<SessionSnapshot>>,
}

impl MemorySessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(snapshot.clone());
        }
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionSnapshot>> {
        Ok(self.slot.lock().ok().and_then(|slot| slot.clone()))
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
        Ok(())
    }
}

/// File-backed session store (JSON at a fixed path)
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store at an explicit path
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the platform-local data directory
    ///
    /// # Errors
    ///
    /// Returns an error when no local data directory can be determined
    pub fn default_location() -> Result<Self> {
        let dir = dirs::data_local_dir()
            .context("no local data directory available")?
            .join("passlink");
        Ok(Self {
            path: dir.join("session.json"),
        })
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("creating session store directory")?;
        }
        let body = serde_json::to_vec_pretty(snapshot).context("serializing session")?;
        fs::write(&self.path, body).context("writing session file")?;
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionSnapshot>> {
        match fs::read(&self.path) {
            Ok(body) => Ok(serde_json::from_slice(&body).ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("reading session file"),
        }
    }

    fn clear(&self) -> Result<()> {
        // Absent file counts as cleared
        let _ = fs::remove_file(&self.path);
        Ok(())
    }
}

/// In-memory session state plus its durable mirror.
///
/// The mirror holds a snapshot only while the session is authenticated and
/// the token unexpired; any other state clears it.
pub struct Session {
    status: SessionStatus,
    tokens: Option<TokenSet>,
    local_user_id: Option<Uuid>,
    last_error: Option<String>,
    store: Box<dyn SessionStore>,
}

impl Session {
    /// Create an idle session over a durable store
    #[must_use]
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            status: SessionStatus::Idle,
            tokens: None,
            local_user_id: None,
            last_error: None,
            store,
        }
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Held token set, when authenticated
    #[must_use]
    pub fn tokens(&self) -> Option<&TokenSet> {
        self.tokens.as_ref()
    }

    /// Resolved local user id, when linked
    #[must_use]
    pub fn local_user_id(&self) -> Option<Uuid> {
        self.local_user_id
    }

    /// Message of the last failure, when in the error state
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Read the durable store once at startup; an unexpired snapshot seeds
    /// the session as authenticated, anything else is discarded.
    pub fn restore(&mut self) {
        match self.store.load() {
            Ok(Some(snapshot)) if !snapshot.tokens.is_expired() => {
                debug!("restored persisted session");
                self.status = SessionStatus::Authenticated;
                self.local_user_id = snapshot.local_user_id;
                self.tokens = Some(snapshot.tokens);
            }
            Ok(Some(_)) => {
                debug!("discarding expired persisted session");
                self.discard_persisted();
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "failed to read persisted session");
                self.discard_persisted();
            }
        }
    }

    /// Mark the exchange as in flight
    pub fn begin_loading(&mut self) {
        self.status = SessionStatus::Loading;
        self.last_error = None;
    }

    /// Enter the authenticated state with a fresh token set
    pub fn login(&mut self, tokens: TokenSet) {
        self.status = SessionStatus::Authenticated;
        self.tokens = Some(tokens);
        self.last_error = None;
        self.persist();
    }

    /// Merge the resolved local user id into an authenticated session
    pub fn set_local_user(&mut self, id: Uuid) {
        self.local_user_id = Some(id);
        self.persist();
    }

    /// Enter the error state, clearing tokens and the durable mirror
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = SessionStatus::Error;
        self.tokens = None;
        self.local_user_id = None;
        self.last_error = Some(message.into());
        self.discard_persisted();
    }

    /// Reset to idle, clearing all fields and the durable mirror
    pub fn logout(&mut self) {
        self.status = SessionStatus::Idle;
        self.tokens = None;
        self.local_user_id = None;
        self.last_error = None;
        self.discard_persisted();
    }

    /// Mirror the current state durably; anything not validly authenticated
    /// clears the store instead.
    fn persist(&self) {
        let valid = self.status == SessionStatus::Authenticated
            && self.tokens.as_ref().is_some_and(|t| !t.is_expired());

        if !valid {
            self.discard_persisted();
            return;
        }

        if let Some(tokens) = &self.tokens {
            let snapshot = SessionSnapshot {
                tokens: tokens.clone(),
                local_user_id: self.local_user_id,
            };
            if let Err(e) = self.store.save(&snapshot) {
                warn!(error = %e, "failed to persist session");
            }
        }
    }

    fn discard_persisted(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear persisted session");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::oauth2::models::TokenResponseBody;

    fn token_set(expires_in: Option<i64>) -> TokenSet {
        TokenSet::from_response(TokenResponseBody {
            access_token: "t".into(),
            token_type: Some("Bearer".into()),
            expires_in,
            refresh_token: None,
            scope: Some("openid".into()),
        })
    }

    #[test]
    fn test_login_persists_and_logout_clears() {
        let mut session = Session::new(Box::new(MemorySessionStore::new()));
        session.login(token_set(Some(3600)));
        assert_eq!(session.status(), SessionStatus::Authenticated);

        let mut other = Session::new(Box::new(MemorySessionStore::new()));
        other.logout();
        assert_eq!(other.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_restore_discards_expired_snapshot() {
        let store = MemorySessionStore::new();
        let mut expired = token_set(Some(3600));
        expired.expires_at = Some(chrono::Utc::now() - chrono::Duration::seconds(10));
        store
            .save(&SessionSnapshot {
                tokens: expired,
                local_user_id: None,
            })
            .unwrap();

        let mut session = Session::new(Box::new(store));
        session.restore();
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_fail_clears_tokens() {
        let mut session = Session::new(Box::new(MemorySessionStore::new()));
        session.login(token_set(Some(3600)));
        session.fail("boom");
        assert_eq!(session.status(), SessionStatus::Error);
        assert!(session.tokens().is_none());
        assert_eq!(session.last_error(), Some("boom"));
    }
}
