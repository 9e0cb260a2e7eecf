use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use super::Storage;
use crate::error::StorageError;

/// Storage persisted as a single JSON object file (`{"key": "value", ...}`).
///
/// The file is read once when opened and rewritten in full on every
/// mutation, so values survive a process restart the same way browser
/// local storage survives a page reload.
pub struct FileStore {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the storage file, treating a missing file as empty storage.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let items = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Storage file '{}' not found, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(items)?)?;
        Ok(())
    }
}

impl Storage for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        self.persist(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned)?;
        if items.remove(key).is_some() {
            self.persist(&items)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get_item("scigateway:token"), None);
        store.set_item("scigateway:token", "abc").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get_item("scigateway:token"),
            Some("abc".to_string())
        );

        reopened.remove_item("scigateway:token").unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("scigateway:token"), None);
    }

    #[test]
    fn test_file_store_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{"darkMode": "true"}"#).unwrap();

        let store = FileStore::open(&path).unwrap();
        store.set_item("scigateway:token", "abc").unwrap();
        store.remove_item("scigateway:token").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("darkMode"), Some("true".to_string()));
    }

    #[test]
    fn test_file_store_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StorageError::Format(_))
        ));
    }
}
