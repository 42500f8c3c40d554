pub mod auth_api;

// Re-export so code outside can do "use crate::api::{AuthApi, ApiConfig};"
pub use auth_api::*;
