use std::sync::Arc;

use tracing::{debug, error};

use super::{memory_store::MemoryStore, Storage};
use crate::error::StorageError;

/// The single well-known key the session token lives under.
pub const TOKEN_KEY: &str = "scigateway:token";

/// A slot holding at most one token in persistent storage.
///
/// Cloning the handle shares the underlying storage, so every clone
/// observes the same token.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// A token store backed by fresh in-memory storage.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn get(&self) -> Option<String> {
        self.storage.get_item(TOKEN_KEY)
    }

    pub fn set(&self, token: &str) -> Result<(), StorageError> {
        debug!("Storing token under '{}'", TOKEN_KEY);
        self.storage.set_item(TOKEN_KEY, token)
    }

    /// Removes the token. A storage failure is logged, never returned.
    pub fn clear(&self) {
        if let Err(e) = self.storage.remove_item(TOKEN_KEY) {
            error!("Failed to clear token from storage: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_store_uses_fixed_key() {
        let storage = Arc::new(MemoryStore::new());
        let tokens = TokenStore::new(storage.clone());

        tokens.set("abc").unwrap();
        assert_eq!(storage.get_item("scigateway:token"), Some("abc".to_string()));
        assert_eq!(tokens.get(), Some("abc".to_string()));

        tokens.clear();
        assert_eq!(tokens.get(), None);
        assert_eq!(storage.get_item("scigateway:token"), None);
    }

    #[test]
    fn test_token_store_clones_share_the_slot() {
        let tokens = TokenStore::in_memory();
        let other = tokens.clone();

        tokens.set("first").unwrap();
        other.set("second").unwrap();
        assert_eq!(tokens.get(), Some("second".to_string()));
    }
}
