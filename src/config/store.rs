use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where tokens are kept between runs. Differentiated via a "type" tag:
///
/// ```yaml
/// storage:
///   type: file
///   path: ~/.scigateway/storage.json
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    #[default]
    Memory,
    File(FileStoreConfig),
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq, Eq)]
pub struct FileStoreConfig {
    pub path: PathBuf,
}
