use std::sync::Arc;

use healthpass::api::{ApiConfig, AuthApi};
use healthpass::config::SessionConfig;
use healthpass::session::SessionManager;
use healthpass::storage::{MemoryStorage, Storage, TOKEN_KEY, USER_KEY};

/// Builds a session manager wired to the given base URI, backed by a fresh
/// in-memory storage that the test can inspect and seed.
pub fn build_session(base_uri: &str) -> (Arc<SessionManager>, Arc<dyn Storage>) {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let manager = Arc::new(SessionManager::new(
        AuthApi::new(&ApiConfig {
            base_uri: base_uri.to_string(),
        }),
        storage.clone(),
        SessionConfig::default(),
    ));
    (manager, storage)
}

/// Seeds durable storage with a previously persisted session.
pub async fn seed_session(storage: &Arc<dyn Storage>, token: &str, user_json: &str) {
    storage
        .set_item(TOKEN_KEY, token)
        .await
        .expect("seeding the token should succeed");
    storage
        .set_item(USER_KEY, user_json)
        .await
        .expect("seeding the user should succeed");
}
