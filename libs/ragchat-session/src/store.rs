use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Fixed keys of the session store.
///
/// The string forms are part of the persisted format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Current access token
    AccessToken,
    /// Current refresh token
    RefreshToken,
    /// Cached user profile (JSON)
    UserProfile,
}

impl SessionKey {
    /// All keys, in clearing order
    pub const ALL: [SessionKey; 3] = [
        SessionKey::AccessToken,
        SessionKey::RefreshToken,
        SessionKey::UserProfile,
    ];

    /// Stable storage key string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SessionKey::AccessToken => "accessToken",
            SessionKey::RefreshToken => "refreshToken",
            SessionKey::UserProfile => "user",
        }
    }
}

/// Credential storage behind the gateway.
///
/// Implementations must be safe for concurrent use; the gateway reads and
/// writes tokens from multiple tasks at once.
pub trait SessionStore: Send + Sync {
    /// Read a value, `None` when absent
    fn get(&self, key: SessionKey) -> Option<String>;

    /// Write a value, replacing any previous one
    fn set(&self, key: SessionKey, value: String);

    /// Remove a value; removing an absent key is a no-op
    fn remove(&self, key: SessionKey);
}

/// In-memory session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<&'static str, String>>,
}

impl MemorySessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.values.lock().get(key.as_str()).cloned()
    }

    fn set(&self, key: SessionKey, value: String) {
        self.values.lock().insert(key.as_str(), value);
    }

    fn remove(&self, key: SessionKey) {
        self.values.lock().remove(key.as_str());
    }
}

/// Durable session store backed by a JSON file.
///
/// Values are kept in memory and flushed to disk on every mutation. Write
/// failures are logged rather than surfaced; the in-memory view stays
/// authoritative for the life of the process.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileSessionStore {
    /// Open a store at `path`, loading existing contents when present.
    ///
    /// A file that exists but cannot be parsed is treated as empty (it will
    /// be overwritten on the next mutation).
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file exists but cannot be read.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        let values = if path.exists() {
            let raw = std::fs::read(&path)?;
            match serde_json::from_slice::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "session file is not valid JSON; starting with an empty session"
                    );
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn flush(&self, values: &HashMap<String, String>) {
        let serialized = match serde_json::to_vec_pretty(values) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize session file");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, serialized) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "failed to persist session file"
            );
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.values.lock().get(key.as_str()).cloned()
    }

    fn set(&self, key: SessionKey, value: String) {
        let mut values = self.values.lock();
        values.insert(key.as_str().to_owned(), value);
        self.flush(&values);
    }

    fn remove(&self, key: SessionKey) {
        let mut values = self.values.lock();
        if values.remove(key.as_str()).is_some() {
            self.flush(&values);
        }
    }
}
