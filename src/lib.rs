//! Linkpage - personal link pages built from ordered components
//!
//! A userpage is an ordered list of headers, paragraphs, post cards and
//! dividers. The server in [`api`] is the single authority over every page;
//! the [`client`] core keeps a cached copy and edits it only by sending one of
//! four canonical operations and adopting the page that comes back.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;
pub mod types;

// Main functional modules
pub mod storage;
pub mod scrape;
pub mod service;
pub mod auth;
pub mod api;
pub mod client;
pub mod system;

// Re-export commonly used items for convenience
pub use types::{Error, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
