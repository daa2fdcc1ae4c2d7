//! Durable session state: the bearer token and the logged-in user.
//!
//! The client never touches storage directly. It goes through a
//! [`SessionStore`], so the backing can be a file, the OS keyring, or plain
//! memory in tests.

use crate::models::{AuthTokens, User};
use directories::ProjectDirs;
use keyring::Entry;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const USER_KEY: &str = "user";

const KEYRING_SERVICE: &str = "ganster";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode session entry: {0}")]
    Encode(String),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("could not determine config directory")]
    NoConfigDir,
}

/// String key-value storage that survives restarts.
///
/// `clear` on a key that isn't there is not an error.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn clear(&self, key: &str) -> Result<(), SessionError>;
}

/// Where the CLI keeps its session between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl SessionBackend {
    pub fn open(self) -> Result<Arc<dyn SessionStore>, SessionError> {
        let store: Arc<dyn SessionStore> = match self {
            SessionBackend::File => Arc::new(FileSessionStore::default_location()?),
            SessionBackend::Keyring => Arc::new(KeyringSessionStore::new(KEYRING_SERVICE)),
            SessionBackend::Memory => Arc::new(MemorySessionStore::default()),
        };
        Ok(store)
    }
}

/// Process-local store. Forgets everything on exit.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// A flat toml table on disk, `session.toml` in the user's config directory
/// by default.
///
/// Every operation re-reads the file so edits made by another process are
/// picked up. An unreadable or malformed file reads as an empty session.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn default_location() -> Result<Self, SessionError> {
        let proj_dirs =
            ProjectDirs::from("com", "ganster", "ganster").ok_or(SessionError::NoConfigDir)?;
        Ok(Self::new(proj_dirs.config_dir().join("session.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<BTreeMap<String, String>, SessionError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        match toml::from_str(&content) {
            Ok(table) => Ok(table),
            Err(e) => {
                warn!("ignoring malformed session file {}: {}", self.path.display(), e);
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_table(&self, table: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(table).map_err(|e| SessionError::Encode(e.to_string()))?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // The file holds a bearer token; it is private to the user from creation.
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        match self.read_table() {
            Ok(mut table) => table.remove(key),
            Err(e) => {
                warn!("could not read session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut table = self.read_table()?;
        table.insert(key.to_string(), value.to_string());
        self.write_table(&table)
    }

    fn clear(&self, key: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        if !self.path.exists() {
            return Ok(());
        }
        let mut table = self.read_table()?;
        if table.remove(key).is_none() {
            return Ok(());
        }
        if table.is_empty() {
            fs::remove_file(&self.path)?;
            Ok(())
        } else {
            self.write_table(&table)
        }
    }
}

/// One OS keyring credential per key, all under the same service name.
#[derive(Debug, Clone)]
pub struct KeyringSessionStore {
    service: String,
}

impl KeyringSessionStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl SessionStore for KeyringSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let entry = Entry::new(&self.service, key).ok()?;
        match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!("could not read {} from keyring: {}", key, e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        Entry::new(&self.service, key)?.set_password(value)?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), SessionError> {
        match Entry::new(&self.service, key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Typed view over a [`SessionStore`].
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::default()))
    }

    /// The persisted access token. An empty string counts as no token.
    pub fn token(&self) -> Option<String> {
        self.store
            .get(ACCESS_TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    /// The persisted user, or `None` if missing or unparsable.
    pub fn user(&self) -> Option<User> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("ignoring corrupt persisted user record: {}", e);
                None
            }
        }
    }

    /// True iff a token is stored. Says nothing about whether the server
    /// still accepts it.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// `Bearer <token>`, read fresh from the store on every call.
    pub fn bearer(&self) -> Option<String> {
        self.token().map(|token| format!("Bearer {}", token))
    }

    /// Stores the user, then the token. If either write fails both entries
    /// are cleared, so a failed persist never leaves a half-written session.
    pub fn persist(&self, tokens: &AuthTokens) -> Result<(), SessionError> {
        let user =
            serde_json::to_string(&tokens.user).map_err(|e| SessionError::Encode(e.to_string()))?;
        let written = self
            .store
            .set(USER_KEY, &user)
            .and_then(|()| self.store.set(ACCESS_TOKEN_KEY, &tokens.access_token));
        if let Err(e) = written {
            if let Err(cleanup) = self.clear() {
                warn!("could not roll back partial session write: {}", cleanup);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Removes both entries. Attempts the second even if the first fails.
    pub fn clear(&self) -> Result<(), SessionError> {
        let token = self.store.clear(ACCESS_TOKEN_KEY);
        let user = self.store.clear(USER_KEY);
        token.and(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> AuthTokens {
        AuthTokens {
            access_token: "tok-123".into(),
            token_type: "bearer".into(),
            user: User {
                id: "u1".into(),
                username: "ferris".into(),
                email: "ferris@example.com".into(),
                role: "user".into(),
                created_at: "2024-05-01T10:00:00".into(),
                is_active: true,
            },
        }
    }

    #[test]
    fn persist_then_clear_in_memory() {
        let session = Session::in_memory();
        assert!(!session.is_authenticated());
        assert_eq!(session.bearer(), None);

        session.persist(&tokens()).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.bearer().as_deref(), Some("Bearer tok-123"));
        assert_eq!(session.user(), Some(tokens().user));

        session.clear().unwrap();
        session.clear().unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.user(), None);
    }

    #[test]
    fn corrupt_user_reads_as_absent() {
        let store = Arc::new(MemorySessionStore::default());
        store.set(USER_KEY, "{not json").unwrap();
        let session = Session::new(store);
        assert_eq!(session.user(), None);
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let store = Arc::new(MemorySessionStore::default());
        store.set(ACCESS_TOKEN_KEY, "").unwrap();
        assert!(!Session::new(store).is_authenticated());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.toml");

        Session::new(Arc::new(FileSessionStore::new(&path)))
            .persist(&tokens())
            .unwrap();
        assert!(path.exists());

        let reopened = Session::new(Arc::new(FileSessionStore::new(&path)));
        assert_eq!(reopened.token().as_deref(), Some("tok-123"));
        assert_eq!(reopened.user().map(|u| u.username), Some("ferris".into()));

        reopened.clear().unwrap();
        assert!(!path.exists());
        reopened.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_private_to_the_user() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        FileSessionStore::new(&path)
            .set(ACCESS_TOKEN_KEY, "secret")
            .unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let fresh = dir.path().join("fresh.toml");
        FileSessionStore::new(&fresh).set(USER_KEY, "{}").unwrap();
        let mode = fs::metadata(&fresh).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn file_store_treats_garbage_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        fs::write(&path, "this is = = not toml").unwrap();

        let store = FileSessionStore::new(&path);
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);

        store.set(ACCESS_TOKEN_KEY, "fresh").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
    }
}
