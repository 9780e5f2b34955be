//! In-memory slot storage. Lives as long as the process.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::SlotStorage;
use crate::error::StorageError;

#[derive(Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}

#[async_trait]
impl SlotStorage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_slot(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn set_slot(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_slot(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.slots.write().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slot_crud() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty().await);

        storage.set_slot("user", "{\"id\":\"1\"}").await.unwrap();
        assert_eq!(
            storage.get_slot("user").await.unwrap().as_deref(),
            Some("{\"id\":\"1\"}")
        );

        // Overwrite
        storage.set_slot("user", "{\"id\":\"2\"}").await.unwrap();
        assert_eq!(storage.len().await, 1);
        assert_eq!(
            storage.get_slot("user").await.unwrap().as_deref(),
            Some("{\"id\":\"2\"}")
        );

        assert!(storage.remove_slot("user").await.unwrap());
        assert!(!storage.remove_slot("user").await.unwrap());
        assert!(storage.get_slot("user").await.unwrap().is_none());
    }
}
