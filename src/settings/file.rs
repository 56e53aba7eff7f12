//! File-backed settings store: one JSON document per store.

use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::error::{WorkerError, WorkerResult};
use crate::settings::SettingsStore;

pub struct FileSettings {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl FileSettings {
    /// Open (or create) the settings document at `path`. A missing file
    /// reads as an empty store.
    pub fn open(path: PathBuf) -> WorkerResult<Self> {
        let values = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Map<String, Value>>(&bytes).map_err(|error| {
                WorkerError::Internal(format!(
                    "malformed settings file {}: {error}",
                    path.display()
                ))
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(error) => {
                return Err(WorkerError::Internal(format!(
                    "failed to read settings file {}: {error}",
                    path.display()
                )))
            }
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn persist(&self, values: &Map<String, Value>) -> WorkerResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                WorkerError::Internal(format!(
                    "failed to create settings directory {}: {error}",
                    parent.display()
                ))
            })?;
        }
        let serialized = serde_json::to_vec_pretty(values)
            .map_err(|error| WorkerError::Internal(format!("settings serialize error: {error}")))?;
        std::fs::write(&self.path, serialized).map_err(|error| {
            WorkerError::Internal(format!(
                "failed to write settings file {}: {error}",
                self.path.display()
            ))
        })
    }
}

impl SettingsStore for FileSettings {
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
        self.persist(&values)
    }
}
