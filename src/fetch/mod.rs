pub mod fetcher;

// Re-export so code outside can do "use crate::fetch::Fetcher;"
pub use fetcher::{FetchOptions, Fetched, Fetcher};
