pub mod base;
pub mod file_store;
pub mod memory_store;
pub mod token_store;

// Re-export the primary storage items so code outside can do
// "use crate::store::{Storage, TokenStore, create_storage};"
pub use base::{create_storage, Storage};
pub use token_store::{TokenStore, TOKEN_KEY};
