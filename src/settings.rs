//! Key/value settings storage backing the persisted decision tier.

pub mod file;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::{WorkerError, WorkerResult};

pub use file::FileSettings;

/// A small persistent key/value store.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> WorkerResult<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> WorkerResult<()>;
}

pub type SharedSettings = Arc<dyn SettingsStore>;

/// In-memory settings store for tests and ephemeral processes.
pub struct MemorySettings {
    values: Mutex<HashMap<String, Value>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> WorkerResult<Option<Value>> {
        let values = self
            .values
            .lock()
            .map_err(|_| WorkerError::Internal("settings lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> WorkerResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| WorkerError::Internal("settings lock poisoned".to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}
