//! Persisted session artifacts.
//!
//! On expiry the client must forget what it persisted about the session
//! (the browser keeps it in local storage under a well-known key). The
//! [`ArtifactStore`] trait is the minimal "remove this key" surface.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};

use crate::StoreError;

/// A key-value store the expiry handler clears.
pub trait ArtifactStore: Send + Sync + 'static {
    /// Remove `key`. Returns `true` if it was present.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl ArtifactStore for MemoryStore {
    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some())
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// A store backed by a single JSON object file, one property per key.
///
/// A missing file is an empty store. Writes replace the whole file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Store `value` under `key`, creating the file if needed.
    pub fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read()?;
        map.insert(key.to_string(), value);
        self.write(&map)
    }

    /// Read the value under `key`.
    pub fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read()?.remove(key))
    }

    fn read(&self) -> Result<Map<String, Value>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Map::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

impl ArtifactStore for JsonFileStore {
    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read()?;
        if map.remove(key).is_none() {
            return Ok(false);
        }
        self.write(&map)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_remove_reports_presence() {
        let store = MemoryStore::new();
        store.insert("auth-session", "token");

        assert!(store.remove("auth-session").unwrap());
        assert!(!store.remove("auth-session").unwrap());
        assert_eq!(store.get("auth-session"), None);
    }

    #[test]
    fn test_json_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("storage.json"));

        assert!(!store.remove("auth-session").unwrap());
        assert_eq!(store.get("auth-session").unwrap(), None);
    }

    #[test]
    fn test_json_file_store_remove_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let store = JsonFileStore::new(&path);
        store.set("auth-session", json!({ "token": "abc" })).unwrap();
        store.set("theme", json!("dark")).unwrap();

        assert!(store.remove("auth-session").unwrap());

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("auth-session").unwrap(), None);
        assert_eq!(reopened.get("theme").unwrap(), Some(json!("dark")));
    }

    #[test]
    fn test_json_file_store_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let result = JsonFileStore::new(&path).remove("auth-session");
        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
