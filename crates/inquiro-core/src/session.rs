//! Bearer credential storage.
//!
//! The credential lives under a single key; its absence is the only signal
//! of "logged out". Callers never hold on to a copy: every request and every
//! route evaluation calls [`SessionStore::get`] again.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::SessionError;

/// Key the bearer token is stored under.
pub const TOKEN_KEY: &str = "access_token";

pub trait SessionStore: Send + Sync {
    /// Current credential, if any. Never mutates the store.
    fn get(&self) -> Option<String>;

    /// Store a credential, replacing any previous one.
    fn set(&self, token: &str) -> Result<(), SessionError>;

    /// Forget the credential. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), SessionError>;

    fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

/// In-process store, used by tests and by embedders that do not want
/// the credential on disk.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<String> {
        self.token.read().clone().filter(|t| !t.is_empty())
    }

    fn set(&self, token: &str) -> Result<(), SessionError> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.token.write() = None;
        Ok(())
    }
}

/// JSON file holding `{ "access_token": "..." }`.
///
/// The file is re-read on every `get`, so a login from the command line is
/// visible to a running terminal session and vice versa. Other keys in the
/// file are preserved.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location under the platform config directory.
    pub fn open_default() -> Result<Self, SessionError> {
        let path = Config::session_path().map_err(|_| SessionError::NoConfigDir)?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, SessionError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(SessionError::Corrupt(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(map)?;
        let mut file = open_private(&self.path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<String> {
        match self.read_map() {
            Ok(map) => map
                .get(TOKEN_KEY)
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            Err(err) => {
                warn!("treating unreadable session file {:?} as logged out: {}", self.path, err);
                None
            }
        }
    }

    fn set(&self, token: &str) -> Result<(), SessionError> {
        // A corrupt file is replaced rather than blocking a fresh login.
        let mut map = self.read_map().unwrap_or_default();
        map.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.write_map(&map)?;
        debug!("session stored at {:?}", self.path);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut map = self.read_map().unwrap_or_default();
        map.remove(TOKEN_KEY);
        self.write_map(&map)?;
        debug!("session cleared at {:?}", self.path);
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Open the token file for writing, readable by the owner only. A new file
/// is created 0600; an existing one is narrowed before any byte is written.
#[cfg(unix)]
fn open_private(path: &Path) -> Result<File, SessionError> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> Result<File, SessionError> {
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}
