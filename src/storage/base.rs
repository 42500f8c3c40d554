use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use super::file_storage::FileStorage;
use super::memory_storage::MemoryStorage;
use crate::config::{StorageBackend, StorageConfig};

/// Key under which the raw bearer token is persisted.
pub const TOKEN_KEY: &str = "token";
/// Key under which the serialized user record is persisted.
pub const USER_KEY: &str = "user";

/// The Storage trait abstracts durable key/value persistence for the
/// session (get, set, remove over string keys).
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, String>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), String>;
    async fn remove_item(&self, key: &str) -> Result<(), String>;
}

/// Creates a concrete storage implementation based on the StorageConfig.
/// If `storage.enabled = false`, returns MemoryStorage: the session still
/// works but does not survive a restart.
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>, String> {
    if !config.enabled {
        info!("Durable storage is disabled. Using MemoryStorage.");
        return Ok(Arc::new(MemoryStorage::new()));
    }

    match &config.backend {
        Some(StorageBackend::File(file_config)) => match FileStorage::new(file_config).await {
            Ok(storage) => {
                info!("Successfully created file storage.");
                Ok(Arc::new(storage))
            }
            Err(e) => {
                error!("Failed to create file storage: {}", e);
                Err(e)
            }
        },
        None => Err("Storage is enabled, but no backend config is provided".to_string()),
    }
}
