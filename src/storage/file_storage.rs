use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::base::Storage;

/// The config struct for file-backed storage. Contains the path of the
/// JSON file holding the persisted entries.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct FileStorageConfig {
    pub path: String,
}

/// A `Storage` implementation persisting entries to a single JSON file of
/// key/value pairs, the on-disk analog of a browser's localStorage.
///
/// The file is read once at construction; every mutation rewrites it
/// through a uniquely named temp file and an atomic rename. Concurrent
/// writers across processes are last-writer-wins.
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Creates a new `FileStorage` rooted at the configured path, loading
    /// any existing entries. An unreadable or corrupt file is discarded
    /// with a warning rather than treated as fatal.
    pub async fn new(config: &FileStorageConfig) -> Result<Self, String> {
        let path = PathBuf::from(&config.path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    format!("Failed to create storage directory '{}': {}", parent.display(), e)
                })?;
            }
        }

        let entries = match fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(
                        "Discarding unreadable storage file '{}': {}",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(format!(
                    "Failed to read storage file '{}': {}",
                    path.display(),
                    e
                ))
            }
        };

        info!(
            "Opened storage file '{}' with {} entries.",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Rewrites the whole file from the given map, via temp file + rename
    /// so readers never observe a half-written file.
    async fn flush(&self, entries: &HashMap<String, String>) -> Result<(), String> {
        let serialized = serde_json::to_string_pretty(entries)
            .map_err(|e| format!("Failed to serialize storage entries: {}", e))?;

        let tmp = self.path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, serialized)
            .await
            .map_err(|e| format!("Failed to write storage file '{}': {}", tmp.display(), e))?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            format!(
                "Failed to replace storage file '{}': {}",
                self.path.display(),
                e
            )
        })?;

        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), String> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_none() {
            debug!("Key '{}' was not present in storage.", key);
            return Ok(());
        }
        self.flush(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config() -> FileStorageConfig {
        let path = std::env::temp_dir().join(format!("healthpass-storage-{}.json", Uuid::new_v4()));
        FileStorageConfig {
            path: path.to_string_lossy().into_owned(),
        }
    }

    /// Test that set/get/remove round-trip within one instance.
    #[tokio::test]
    async fn test_set_get_remove() {
        let config = temp_config();
        let storage = FileStorage::new(&config).await.expect("storage should open");

        storage.set_item("token", "t1").await.expect("set should succeed");
        assert_eq!(
            storage.get_item("token").await.expect("get should succeed"),
            Some("t1".to_string())
        );

        storage
            .remove_item("token")
            .await
            .expect("remove should succeed");
        assert_eq!(
            storage.get_item("token").await.expect("get should succeed"),
            None
        );

        let _ = fs::remove_file(&config.path).await;
    }

    /// Test that entries survive reopening the same file.
    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let config = temp_config();
        {
            let storage = FileStorage::new(&config).await.expect("storage should open");
            storage.set_item("token", "t1").await.expect("set should succeed");
            storage
                .set_item("user", r#"{"id":1,"username":"alice"}"#)
                .await
                .expect("set should succeed");
        }

        let reopened = FileStorage::new(&config).await.expect("storage should reopen");
        assert_eq!(
            reopened.get_item("token").await.expect("get should succeed"),
            Some("t1".to_string())
        );
        assert!(reopened
            .get_item("user")
            .await
            .expect("get should succeed")
            .is_some());

        let _ = fs::remove_file(&config.path).await;
    }

    /// Test that removing a missing key is not an error.
    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let config = temp_config();
        let storage = FileStorage::new(&config).await.expect("storage should open");
        assert!(storage.remove_item("nope").await.is_ok());
    }

    /// Test that a corrupt file is discarded instead of failing the open.
    #[tokio::test]
    async fn test_corrupt_file_is_discarded() {
        let config = temp_config();
        fs::write(&config.path, "{not json")
            .await
            .expect("corrupt seed should write");

        let storage = FileStorage::new(&config).await.expect("storage should open");
        assert_eq!(
            storage.get_item("token").await.expect("get should succeed"),
            None
        );

        let _ = fs::remove_file(&config.path).await;
    }
}
