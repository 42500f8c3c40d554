use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::base::Storage;

/// An in-memory `Storage` used when durable persistence is disabled and
/// throughout the test suites. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self
            .entries
            .lock()
            .expect("memory storage mutex poisoned")
            .get(key)
            .cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        self.entries
            .lock()
            .expect("memory storage mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), String> {
        self.entries
            .lock()
            .expect("memory storage mutex poisoned")
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that set/get/remove round-trip.
    #[tokio::test]
    async fn test_set_get_remove() {
        let storage = MemoryStorage::new();

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
    }

    /// Test that overwriting a key keeps the latest value.
    #[tokio::test]
    async fn test_last_writer_wins() {
        let storage = MemoryStorage::new();
        storage.set_item("token", "t1").await.expect("set should succeed");
        storage.set_item("token", "t2").await.expect("set should succeed");
        assert_eq!(
            storage.get_item("token").await.expect("get should succeed"),
            Some("t2".to_string())
        );
    }
}
