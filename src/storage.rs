//! Persistence backends.
//!
//! The storage seam is a whole-value key store: each key holds an ordered
//! list of strings (or a boolean flag) and is always read and written as a
//! unit. The file backend keeps every key in a single JSON object; the
//! in-memory backend exists for tests and can be told to fail writes.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(test)]
use std::sync::Mutex;

pub const KEY_VISITED_LINKS: &str = "strictVisitedLinks";
pub const KEY_VISITED_TITLES: &str = "strictVisitedTitles";
pub const KEY_VISITED_ALTS: &str = "strictVisitedAlts";
pub const KEY_HIGHLIGHT_ENABLED: &str = "highlightEnabled";

pub trait StorageBackend {
    fn load_list(&self, key: &str) -> Result<Vec<String>>;
    fn save_list(&self, key: &str, values: &[String]) -> Result<()>;
    fn load_flag(&self, key: &str, default: bool) -> Result<bool>;
    fn save_flag(&self, key: &str, value: bool) -> Result<()>;
}

/// File-backed store: one JSON object holding all keys, rewritten in full
/// on every save. Concurrent writers race last-write-wins on the whole
/// file; no locking is attempted.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        Ok(PathBuf::from(home).join(".visited-links.json"))
    }

    fn read_object(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("could not read storage file {:?}", self.path))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("storage file {:?} is not valid JSON", self.path))?;
        match value {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("storage file {:?} does not hold a JSON object", self.path),
        }
    }

    fn write_object(&self, map: Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create storage directory {:?}", parent))?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(&self.path, content)
            .with_context(|| format!("could not write storage file {:?}", self.path))?;
        Ok(())
    }
}

impl StorageBackend for JsonFileStorage {
    fn load_list(&self, key: &str) -> Result<Vec<String>> {
        let map = self.read_object()?;
        match map.get(key) {
            Some(value) => serde_json::from_value(value.clone())
                .with_context(|| format!("storage key {} does not hold a string list", key)),
            None => Ok(Vec::new()),
        }
    }

    fn save_list(&self, key: &str, values: &[String]) -> Result<()> {
        let mut map = self.read_object()?;
        map.insert(key.to_string(), serde_json::to_value(values)?);
        self.write_object(map)?;
        debug!("saved {} entries under {}", values.len(), key);
        Ok(())
    }

    fn load_flag(&self, key: &str, default: bool) -> Result<bool> {
        let map = self.read_object()?;
        match map.get(key) {
            Some(Value::Bool(value)) => Ok(*value),
            Some(_) => anyhow::bail!("storage key {} does not hold a boolean", key),
            None => Ok(default),
        }
    }

    fn save_flag(&self, key: &str, value: bool) -> Result<()> {
        let mut map = self.read_object()?;
        map.insert(key.to_string(), Value::Bool(value));
        self.write_object(map)
    }
}

/// In-memory store for tests. `set_fail_writes(true)` makes every save
/// return an error so write-failure recovery can be exercised.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, Value>>,
    fail_writes: AtomicBool,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("storage quota exceeded");
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        match self.values.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
impl StorageBackend for MemoryStorage {
    fn load_list(&self, key: &str) -> Result<Vec<String>> {
        match self.lock().get(key) {
            Some(value) => serde_json::from_value(value.clone())
                .with_context(|| format!("storage key {} does not hold a string list", key)),
            None => Ok(Vec::new()),
        }
    }

    fn save_list(&self, key: &str, values: &[String]) -> Result<()> {
        self.check_writable()?;
        self.lock()
            .insert(key.to_string(), serde_json::to_value(values)?);
        Ok(())
    }

    fn load_flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.lock().get(key) {
            Some(Value::Bool(value)) => Ok(*value),
            Some(_) => anyhow::bail!("storage key {} does not hold a boolean", key),
            None => Ok(default),
        }
    }

    fn save_flag(&self, key: &str, value: bool) -> Result<()> {
        self.check_writable()?;
        self.lock().insert(key.to_string(), Value::Bool(value));
        Ok(())
    }
}
