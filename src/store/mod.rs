//! Persistence layer: string-keyed durable slots for the session.

pub mod file;
pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

use std::sync::Arc;

pub use file::JsonFileStorage;
pub use libsql_backend::LibSqlStorage;
pub use memory::MemoryStorage;
pub use traits::{SlotStorage, load_json, save_json, slot_keys};

use crate::config::StorageBackend;
use crate::error::StorageError;

/// Open the backend selected in configuration.
pub async fn open(backend: &StorageBackend) -> Result<Arc<dyn SlotStorage>, StorageError> {
    let storage: Arc<dyn SlotStorage> = match backend {
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::File(path) => Arc::new(JsonFileStorage::open(path).await?),
        StorageBackend::LibSql(path) => Arc::new(LibSqlStorage::new_local(path).await?),
    };
    Ok(storage)
}
