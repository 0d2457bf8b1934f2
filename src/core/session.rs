//! Persisted session identity.
//!
//! Login stores who the caller is; every screen receives the typed
//! [`SessionState`] instead of re-reading storage ad hoc. The client never
//! refreshes or validates a session; the backend owns that.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub full_name: String,
}

/// Whether the caller is logged in. An `Anonymous` state redirects to the
/// login flow instead of leaving nullable identity fields to check ad hoc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated(Session),
    Anonymous,
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Anonymous => None,
        }
    }

    pub fn load() -> Result<Self, SessionError> {
        Self::load_from_path(&session_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, SessionError> {
        if !path.exists() {
            return Ok(SessionState::Anonymous);
        }
        let contents = fs::read_to_string(path).map_err(|source| SessionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let session: Session =
            toml::from_str(&contents).map_err(|source| SessionError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(SessionState::Authenticated(session))
    }
}

impl Session {
    pub fn save(&self) -> Result<(), Box<dyn StdError>> {
        self.save_to_path(&session_path())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), Box<dyn StdError>> {
        let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };

        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(path)
            .map_err(|err| -> Box<dyn StdError> { Box::new(err) })?;
        Ok(())
    }
}

/// Remove the stored session. Missing file counts as already logged out.
pub fn clear_session() -> Result<(), std::io::Error> {
    clear_session_at(&session_path())
}

pub fn clear_session_at(path: &Path) -> Result<(), std::io::Error> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

pub fn session_path() -> PathBuf {
    let proj_dirs = ProjectDirs::from("org", "permacommons", "botline")
        .expect("Failed to determine config directory");
    proj_dirs.config_dir().join("session.toml")
}

/// Errors reading the stored session from disk.
#[derive(Debug)]
pub enum SessionError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Read { path, source } => {
                write!(f, "Failed to read session at {}: {}", path.display(), source)
            }
            SessionError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse session at {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl StdError for SessionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SessionError::Read { source, .. } => Some(source),
            SessionError::Parse { source, .. } => Some(source),
        }
    }
}
