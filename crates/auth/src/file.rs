//! Durable, file-backed session storage.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::store::remembered;
use crate::{Session, SessionStore, SessionStoreError};

/// JSON file holding the current session.
///
/// Writes land in a sibling temp file which is then renamed over the target,
/// so readers never see a half-written session.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<data dir>/offerdesk/session.json`, when the platform has a data dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("offerdesk").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SessionStore for FileSessionStore {
    fn stored_session(&self) -> Result<Option<Session>, SessionStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if raw.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn persist_session(&self, session: &Session, remember: bool) -> Result<(), SessionStoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| SessionStoreError::LockPoisoned)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let payload = serde_json::to_vec_pretty(&remembered(session, remember))?;
        let temp = self.temp_path();
        {
            let mut file = fs::File::create(&temp)?;
            file.write_all(&payload)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;

        tracing::debug!(path = %self.path.display(), "session persisted");
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionStoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| SessionStoreError::LockPoisoned)?;

        for path in [self.path.clone(), self.temp_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}
