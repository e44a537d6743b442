//! Small persisted values addressed by string key.
//!
//! Each owner (e.g. `SourceHistory`) uses its own keys.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::atomic::write_atomically;

/// Get/set persistence for small JSON values.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`. The value is visible to `get` even when
    /// writing it to durable storage fails.
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Reads `key` and decodes it as `T`. A malformed value is logged and
/// treated as absent.
pub fn read_value<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let value = store.get(key)?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            crate::log(&format!("Ignoring malformed value for '{}': {}", key, e));
            None
        }
    }
}

/// In-process store with no durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a single JSON object document, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Opens the document at `path`.
    ///
    /// A missing document starts empty. An unreadable one also starts empty,
    /// and the reason is returned so the caller can warn about it.
    pub fn open(path: impl AsRef<Path>) -> (Self, Option<anyhow::Error>) {
        let path = path.as_ref().to_path_buf();
        let (entries, warning) = match load_document(&path) {
            Ok(entries) => (entries, None),
            Err(e) => {
                crate::log(&format!("Settings unreadable, starting empty: {:#}", e));
                (Map::new(), Some(e))
            }
        };

        let store = Self {
            path,
            entries: Mutex::new(entries),
        };
        (store, warning)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        // held across the write: one writer at a time
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value);

        let bytes = serde_json::to_vec_pretty(&*entries)?;
        write_atomically(&self.path, &bytes).with_context(|| {
            format!("Failed to write settings to {}", self.path.display())
        })
    }
}

fn load_document(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
