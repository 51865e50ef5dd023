//! System monitoring
//!
//! Prometheus metrics for page edits, scraping, posts and sessions.

pub mod metrics;
