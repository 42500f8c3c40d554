pub mod session;
pub mod user;

// Re-export the primary model items so code outside can do
// "use crate::models::{SessionSnapshot, User};"
pub use session::SessionSnapshot;
pub use user::{User, ROLE_ADMIN, ROLE_NURSE, ROLE_PARENT, ROLE_STUDENT};
