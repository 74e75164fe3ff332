use crate::{
    error::{Result, StudioError},
    storage::traits::KeyValueStore,
};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// A JSON object file mapping keys to string values.
///
/// Every write replaces the file through a sibling temp file and a rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StudioError::PersistedStateCorrupt(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(StudioError::PersistedStateCorrupt(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write(&self, payload: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut tmp_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, serde_json::to_string_pretty(payload)?)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let payload = self.read()?;
        match payload.get(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut payload = self.read()?;
        payload.insert(key.to_string(), Value::String(value.to_string()));
        self.write(&payload)
    }

    /// Removing from an unreadable file starts it over.
    fn remove(&mut self, key: &str) -> Result<()> {
        let mut payload = match self.read() {
            Ok(payload) => payload,
            Err(StudioError::PersistedStateCorrupt(reason)) => {
                log::warn!("Discarding unreadable store: {}", reason);
                Map::new()
            }
            Err(e) => return Err(e),
        };
        payload.remove(key);
        self.write(&payload)
    }
}
