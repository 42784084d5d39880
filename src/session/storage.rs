//! Client-local persistence for the session tokens. Only the long-lived session
//! is stored; the step-up action token is memory-only and has no path here.

use super::Principal;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

/// Serialized session as written to client storage.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub principal: Principal,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

pub trait TokenStorage: Send + Sync {
    /// # Errors
    /// Returns an error if the backing store cannot be read or decoded.
    fn load(&self) -> io::Result<Option<StoredSession>>;

    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn save(&self, session: &StoredSession) -> io::Result<()>;

    /// # Errors
    /// Returns an error if the backing store cannot be cleared.
    fn clear(&self) -> io::Result<()>;
}

#[derive(Default)]
pub struct MemoryTokenStorage {
    session: Mutex<Option<StoredSession>>,
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> io::Result<Option<StoredSession>> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &StoredSession) -> io::Result<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// JSON file storage. The file is replaced atomically and restricted to the
/// owner on Unix.
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> io::Result<Option<StoredSession>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };

        serde_json::from_slice(&contents)
            .map(Some)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    fn save(&self, session: &StoredSession) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let payload = serde_json::to_vec_pretty(session)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        let tmp = self.path.with_extension("tmp");
        let mut file = owner_only().open(&tmp)?;
        // A leftover file from a crashed run keeps its old mode.
        restrict_permissions(&tmp)?;
        file.write_all(&payload)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &self.path)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

/// Opens for writing; a new file is created as 0600 on Unix.
fn owner_only() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
