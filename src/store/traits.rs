//! `SlotStorage` trait: the durable key/value cells behind a session.
//!
//! Values are opaque strings. The session layer stores JSON in them through
//! [`load_json`] and [`save_json`].

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// Slot names used by the session layer.
pub mod slot_keys {
    /// Serialized `Identity`.
    pub const USER: &str = "user";
    /// Serialized `Profile`.
    pub const PROFILE: &str = "profile";
    /// Local authenticator account registry.
    pub const ACCOUNTS: &str = "accounts";
}

/// Backend-agnostic string-keyed storage.
#[async_trait]
pub trait SlotStorage: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Read a slot. `None` if it was never written or has been removed.
    async fn get_slot(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write (or overwrite) a slot.
    async fn set_slot(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a slot. Returns whether it existed.
    async fn remove_slot(&self, key: &str) -> Result<bool, StorageError>;
}

/// Read a slot and deserialize it as JSON.
pub async fn load_json<T: DeserializeOwned>(
    storage: &dyn SlotStorage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match storage.get_slot(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Serialization(format!("slot '{key}': {e}"))),
        None => Ok(None),
    }
}

/// Serialize a value as JSON and write it to a slot.
pub async fn save_json<T: Serialize + ?Sized>(
    storage: &dyn SlotStorage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)
        .map_err(|e| StorageError::Serialization(format!("slot '{key}': {e}")))?;
    storage.set_slot(key, &raw).await
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::store::MemoryStorage;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn json_helpers_roundtrip_through_slot() {
        let storage = MemoryStorage::new();
        let sample = Sample {
            name: "alice".into(),
            count: 3,
        };
        save_json(&storage, "sample", &sample).await.unwrap();

        let raw = storage.get_slot("sample").await.unwrap().unwrap();
        assert!(raw.contains("\"alice\""));

        let loaded: Option<Sample> = load_json(&storage, "sample").await.unwrap();
        assert_eq!(loaded, Some(sample));
    }

    #[tokio::test]
    async fn load_json_missing_slot_is_none() {
        let storage = MemoryStorage::new();
        let loaded: Option<Sample> = load_json(&storage, "nothing").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn load_json_reports_corrupt_slot() {
        let storage = MemoryStorage::new();
        storage.set_slot("sample", "{not json").await.unwrap();
        let err = load_json::<Sample>(&storage, "sample").await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
        assert!(!err.is_unavailable());
    }
}
