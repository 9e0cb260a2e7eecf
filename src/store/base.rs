use std::sync::Arc;

use tracing::info;

use super::{file_store::FileStore, memory_store::MemoryStore};
use crate::config::StoreConfig;
use crate::error::StorageError;

/// The Storage trait abstracts persistent client storage: a flat map of
/// string keys to string values that outlives a single session.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Creates a concrete storage backend based on the StoreConfig.
pub fn create_storage(config: &StoreConfig) -> Result<Arc<dyn Storage>, StorageError> {
    match config {
        StoreConfig::Memory => {
            info!("Using in-memory storage; tokens will not survive a restart.");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreConfig::File(file_config) => {
            info!("Using file storage at '{}'", file_config.path.display());
            Ok(Arc::new(FileStore::open(&file_config.path)?))
        }
    }
}
