//! Persistent key-value backends and the typed session accessor over them.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use super::error::{Result, StorageError};

/// Synchronous string-to-string store with local-storage semantics.
pub trait KeyValueStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError>;

    fn remove(&self, key: &str) -> std::result::Result<(), StorageError>;
}

/// Process-local store. Contents are lost when the last handle is dropped.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<DashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store persisted as a JSON object on disk.
///
/// The whole file is read on open and rewritten on every change via a sibling `.tmp` file.
/// Memory only reflects a change once it is on disk.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> std::result::Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), keys = entries.len(), "Opened session store");
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) -> std::result::Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

/// The three persisted session slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionField {
    IdToken,
    Nonce,
    AuthStyle,
}

impl SessionField {
    pub const ALL: [SessionField; 3] = [Self::IdToken, Self::Nonce, Self::AuthStyle];

    /// Storage key. Changing one orphans existing sessions.
    pub fn key(&self) -> &'static str {
        match self {
            Self::IdToken => "starberry_auth.id_token",
            Self::Nonce => "starberry_auth.nonce",
            Self::AuthStyle => "starberry_auth.auth_style",
        }
    }
}

/// Typed accessor over a shared [`KeyValueStore`].
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Session store over a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryKeyValueStore::new()))
    }

    pub fn get(&self, field: SessionField) -> Option<String> {
        self.backend.get(field.key())
    }

    pub fn set(&self, field: SessionField, value: &str) -> Result<()> {
        self.backend.set(field.key(), value)?;
        Ok(())
    }

    pub fn clear(&self, field: SessionField) -> Result<()> {
        self.backend.remove(field.key())?;
        Ok(())
    }

    pub fn clear_all(&self) -> Result<()> {
        for field in SessionField::ALL {
            self.clear(field)?;
        }
        Ok(())
    }
}
