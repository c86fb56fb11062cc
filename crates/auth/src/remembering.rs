//! "Remember me" routing between a volatile and a durable store.

use crate::{Session, SessionStore, SessionStoreError};

/// Routes each write to the durable backend when the user asked to be
/// remembered and to the volatile backend otherwise.
///
/// The backend not written to is cleared on every write so exactly one
/// session is authoritative. Reads prefer the volatile backend.
#[derive(Debug)]
pub struct RememberingSessionStore<V, D> {
    volatile: V,
    durable: D,
}

impl<V: SessionStore, D: SessionStore> RememberingSessionStore<V, D> {
    pub fn new(volatile: V, durable: D) -> Self {
        Self { volatile, durable }
    }

    pub fn volatile(&self) -> &V {
        &self.volatile
    }

    pub fn durable(&self) -> &D {
        &self.durable
    }
}

impl<V: SessionStore, D: SessionStore> SessionStore for RememberingSessionStore<V, D> {
    fn stored_session(&self) -> Result<Option<Session>, SessionStoreError> {
        match self.volatile.stored_session()? {
            Some(session) => Ok(Some(session)),
            None => self.durable.stored_session(),
        }
    }

    fn persist_session(&self, session: &Session, remember: bool) -> Result<(), SessionStoreError> {
        if remember {
            self.durable.persist_session(session, true)?;
            self.volatile.clear_session()
        } else {
            self.volatile.persist_session(session, false)?;
            self.durable.clear_session()
        }
    }

    fn clear_session(&self) -> Result<(), SessionStoreError> {
        self.volatile.clear_session()?;
        self.durable.clear_session()
    }
}
