//! Configuration store
//!
//! Flat key/value settings record, read by key list and written by merge.
//! [`MemoryStore`] backs tests and embedded hosts; [`JsonFileStore`] persists
//! the record as one JSON object on disk.

use crate::error::StoreError;
use dashmap::DashMap;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Settings record as stored
pub type SettingsMap = serde_json::Map<String, Value>;

/// Key/value settings storage
#[async_trait::async_trait]
pub trait ConfigStore: Send + Sync {
    /// Values for `keys`; absent keys are omitted from the result
    async fn get(&self, keys: &[&str]) -> Result<SettingsMap, StoreError>;

    /// Merge `values` into the record
    async fn set(&self, values: SettingsMap) -> Result<(), StoreError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, Value>,
}

impl MemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `values`
    #[must_use]
    pub fn with_values(values: SettingsMap) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Number of stored keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[async_trait::async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<SettingsMap, StoreError> {
        Ok(keys
            .iter()
            .filter_map(|key| {
                self.values
                    .get(*key)
                    .map(|value| ((*key).to_string(), value.clone()))
            })
            .collect())
    }

    async fn set(&self, values: SettingsMap) -> Result<(), StoreError> {
        for (key, value) in values {
            self.values.insert(key, value);
        }
        Ok(())
    }
}

/// Store backed by a JSON object file
///
/// A missing file reads as an empty record. Writes rewrite the whole file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Store at `path`; the file is created on first write
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<SettingsMap, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(SettingsMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(SettingsMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait::async_trait]
impl ConfigStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<SettingsMap, StoreError> {
        let mut all = self.read_all().await?;
        Ok(keys
            .iter()
            .filter_map(|key| all.remove(*key).map(|value| ((*key).to_string(), value)))
            .collect())
    }

    async fn set(&self, values: SettingsMap) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.read_all().await?;
        all.extend(values);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&all)?;
        tokio::fs::write(&self.path, content).await?;
        tracing::debug!(path = %self.path.display(), keys = all.len(), "settings written");
        Ok(())
    }
}
