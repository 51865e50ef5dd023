//! Core system foundations
//!
//! Configuration, logging setup, application state and the factory that
//! wires them together.

/// Configuration management
pub mod config;
/// Tracing subscriber setup
pub mod logging;
/// Application state management
pub mod app_state;
/// Application factory
pub mod factory;

// Re-export commonly used items
pub use config::{load_config_or_default, Config};
pub use app_state::AppState;
pub use factory::{create_app_state, create_app_state_with_scraper, ConfiguredAppState};
