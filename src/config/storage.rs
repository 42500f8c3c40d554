use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::storage::file_storage::FileStorageConfig;

/// A wrapper for the storage configuration:
/// - enabled: if false, sessions live in memory only and do not survive a restart.
/// - backend: the actual durable backend (file, etc.).
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct StorageConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub backend: Option<StorageBackend>,
}

/// The existing storage backends. We differentiate them via a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
#[serde(tag = "type")]
pub enum StorageBackend {
    #[serde(rename = "file")]
    File(FileStorageConfig),
    // Add more variants here as needed, like:
    // #[serde(rename = "keyring")]
    // Keyring(KeyringStorageConfig),
}
