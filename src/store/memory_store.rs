use std::collections::HashMap;
use std::sync::RwLock;

use super::Storage;
use crate::error::StorageError;

/// Process-lifetime storage. Nothing is written to disk.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("key"), None);

        store.set_item("key", "value").unwrap();
        assert_eq!(store.get_item("key"), Some("value".to_string()));

        store.set_item("key", "other").unwrap();
        assert_eq!(store.get_item("key"), Some("other".to_string()));

        store.remove_item("key").unwrap();
        assert_eq!(store.get_item("key"), None);
    }

    #[test]
    fn test_memory_store_remove_missing_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.remove_item("missing").is_ok());
    }
}
