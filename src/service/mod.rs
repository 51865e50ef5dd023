//! Authority-side services over the store

/// Page operations
pub mod pages;
/// Post ingestion and listing
pub mod posts;

pub use pages::PageProcessor;
pub use posts::{PostService, FEED_LIMIT};
