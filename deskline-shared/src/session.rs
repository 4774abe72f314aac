//! Session lifecycle and the shared auth-error handler.
//!
//! The session lives in a `watch` channel so long-running tasks (the
//! notification poller) can stop as soon as the user is logged out.

use std::sync::Arc;

use tokio::sync::watch;

use crate::clients::storage::{LocalStore, SESSION_KEY};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::types::auth::Session;

pub struct SessionStore {
    store: LocalStore,
    current: watch::Sender<Option<Session>>,
}

impl SessionStore {
    /// Loads the persisted session, if any. An unreadable session is treated
    /// as logged out.
    pub fn load(store: LocalStore) -> Self {
        let session = match store.get::<Session>(SESSION_KEY) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "stored session unreadable, starting logged out");
                None
            }
        };

        let (current, _) = watch::channel(session);
        Self { store, current }
    }

    pub fn current(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.require().is_ok()
    }

    /// The precondition every backend call checks before touching the network.
    pub fn require(&self) -> AppResult<Session> {
        let session = self.current().ok_or_else(AppError::session_missing)?;
        if session.is_expired() {
            return Err(AppError::session_expired());
        }
        Ok(session)
    }

    pub fn login(&self, session: Session) -> AppResult<()> {
        self.store.set(SESSION_KEY, &session)?;
        if let Some(user) = &session.user {
            tracing::info!(user_id = user.id, role = %user.role, "session started");
        } else {
            tracing::info!("session started");
        }
        self.current.send_replace(Some(session));
        Ok(())
    }

    pub fn logout(&self) -> AppResult<()> {
        let was_active = self.current.send_replace(None).is_some();
        self.store.remove(SESSION_KEY)?;
        if was_active {
            tracing::info!("session cleared");
        }
        Ok(())
    }

    /// Receiver that observes login/logout transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }
}

/// Shared sink for authentication failures raised by any backend call.
pub trait AuthErrorHandler: Send + Sync {
    fn handle_auth_error(&self, err: &AppError);
}

/// Default handler: a rejected or expired session forces a logout.
pub struct ForceLogout {
    sessions: Arc<SessionStore>,
}

impl ForceLogout {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }
}

impl AuthErrorHandler for ForceLogout {
    fn handle_auth_error(&self, err: &AppError) {
        if !err.is_auth_failure() {
            return;
        }

        match err.code() {
            ErrorCode::SessionMissing => {
                tracing::debug!("request attempted without a session");
            }
            code => {
                tracing::warn!(code = code.code(), error = %err, "authentication failed, forcing logout");
                if let Err(e) = self.sessions.logout() {
                    tracing::error!(error = %e, "failed to clear session");
                }
            }
        }
    }
}
