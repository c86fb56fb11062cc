//! Process-lifetime session storage.

use std::sync::RwLock;

use crate::store::remembered;
use crate::{Session, SessionStore, SessionStoreError};

/// Volatile store: the session lives as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `session` (handy for tests and embedding).
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn stored_session(&self) -> Result<Option<Session>, SessionStoreError> {
        let guard = self
            .session
            .read()
            .map_err(|_| SessionStoreError::LockPoisoned)?;
        Ok(guard.clone())
    }

    fn persist_session(&self, session: &Session, remember: bool) -> Result<(), SessionStoreError> {
        let mut guard = self
            .session
            .write()
            .map_err(|_| SessionStoreError::LockPoisoned)?;
        *guard = Some(remembered(session, remember));
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionStoreError> {
        let mut guard = self
            .session
            .write()
            .map_err(|_| SessionStoreError::LockPoisoned)?;
        *guard = None;
        Ok(())
    }
}
