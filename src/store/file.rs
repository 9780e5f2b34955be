//! JSON file slot storage.
//!
//! The whole store is one JSON object (`{"user": "...", "profile": "..."}`)
//! rewritten on every change. Writes go to a sibling temp file first and are
//! renamed into place, so a crash never leaves a half-written store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::traits::SlotStorage;
use crate::error::StorageError;

type SlotMap = BTreeMap<String, String>;

pub struct JsonFileStorage {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl JsonFileStorage {
    /// Open a store at `path`, creating parent directories as needed. The
    /// file itself is created lazily on first write.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::Unavailable(format!(
                    "Failed to create storage directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        info!(path = %path.display(), "File storage opened");
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<SlotMap, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(SlotMap::new()),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                StorageError::Serialization(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SlotMap::new()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn write_map(&self, map: &SlotMap) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), slots = map.len(), "File storage written");
        Ok(())
    }
}

#[async_trait]
impl SlotStorage for JsonFileStorage {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_slot(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.remove(key))
    }

    async fn set_slot(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }

    async fn remove_slot(&self, key: &str) -> Result<bool, StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        let existed = map.remove(key).is_some();
        if existed {
            self.write_map(&map).await?;
        }
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("dir").join("session.json");
        let storage = JsonFileStorage::open(&path).await.unwrap();
        assert!(path.parent().unwrap().exists());
        // Nothing written yet
        assert!(!path.exists());
        assert!(storage.get_slot("user").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn slots_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.json");

        {
            let storage = JsonFileStorage::open(&path).await.unwrap();
            storage.set_slot("user", "u").await.unwrap();
            storage.set_slot("profile", "p").await.unwrap();
        }

        let reopened = JsonFileStorage::open(&path).await.unwrap();
        assert_eq!(reopened.get_slot("user").await.unwrap().as_deref(), Some("u"));
        assert_eq!(reopened.get_slot("profile").await.unwrap().as_deref(), Some("p"));

        assert!(reopened.remove_slot("user").await.unwrap());
        assert!(!reopened.remove_slot("user").await.unwrap());
        assert!(reopened.get_slot("user").await.unwrap().is_none());
        // Temp file is renamed away
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, "{{{").unwrap();

        let storage = JsonFileStorage::open(&path).await.unwrap();
        let err = storage.get_slot("user").await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
