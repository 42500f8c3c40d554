pub mod auth_client;

// Re-export so code outside can do "use crate::client::AuthClient;"
pub use auth_client::AuthClient;
