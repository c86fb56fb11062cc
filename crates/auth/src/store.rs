//! Session storage contract.

use std::sync::Arc;

use thiserror::Error;

use crate::Session;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("session storage lock poisoned")]
    LockPoisoned,
}

/// Single source of truth for auth state.
///
/// Implementations must make `persist_session` atomic from the caller's point
/// of view: a read that follows a write observes either the old session or the
/// new one, never a mix. Errors are surfaced, never swallowed.
pub trait SessionStore: Send + Sync {
    fn stored_session(&self) -> Result<Option<Session>, SessionStoreError>;

    /// Overwrite the stored session. `remember` selects durable storage where
    /// the backend distinguishes it and is recorded on the stored session.
    fn persist_session(&self, session: &Session, remember: bool) -> Result<(), SessionStoreError>;

    /// Remove all stored session data. Must succeed when nothing is stored.
    fn clear_session(&self) -> Result<(), SessionStoreError>;

    fn access_token(&self) -> Result<Option<String>, SessionStoreError> {
        Ok(self
            .stored_session()?
            .map(|session| session.access_token)
            .filter(|token| !token.is_empty()))
    }

    fn refresh_token(&self) -> Result<Option<String>, SessionStoreError> {
        Ok(self
            .stored_session()?
            .map(|session| session.refresh_token)
            .filter(|token| !token.is_empty()))
    }
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn stored_session(&self) -> Result<Option<Session>, SessionStoreError> {
        (**self).stored_session()
    }

    fn persist_session(&self, session: &Session, remember: bool) -> Result<(), SessionStoreError> {
        (**self).persist_session(session, remember)
    }

    fn clear_session(&self) -> Result<(), SessionStoreError> {
        (**self).clear_session()
    }

    fn access_token(&self) -> Result<Option<String>, SessionStoreError> {
        (**self).access_token()
    }

    fn refresh_token(&self) -> Result<Option<String>, SessionStoreError> {
        (**self).refresh_token()
    }
}

/// Copy of `session` with the `remember` flag the caller persisted it under.
pub(crate) fn remembered(session: &Session, remember: bool) -> Session {
    Session {
        remember,
        ..session.clone()
    }
}
