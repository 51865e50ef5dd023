//! Application Factory
//!
//! This module provides factory functions for creating and initializing the AppState
//! with all required services based on configuration.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::core::app_state::AppState;
use crate::core::config::{Config, StorageType};
use crate::scrape::{self, LinkScraper};
use crate::storage::{FileStorage, FileStore, SimpleStorage, SimpleStore};
use crate::types::Result;

/// Enum to hold different AppState configurations
pub enum ConfiguredAppState {
    /// Configuration using the in-memory backend
    Memory {
        /// The application state with SimpleStorage
        app_state: Arc<AppState<SimpleStorage>>,
    },
    /// Configuration using the JSON snapshot backend
    File {
        /// The application state with FileStorage
        app_state: Arc<AppState<FileStorage>>,
    },
}

impl ConfiguredAppState {
    /// Get the HTTP address from config
    pub fn http_addr(&self) -> SocketAddr {
        match self {
            ConfiguredAppState::Memory { app_state } => app_state.config.server.http_addr,
            ConfiguredAppState::File { app_state } => app_state.config.server.http_addr,
        }
    }

    /// Backend name for logs
    pub fn storage_name(&self) -> &'static str {
        match self {
            ConfiguredAppState::Memory { .. } => "memory",
            ConfiguredAppState::File { .. } => "file",
        }
    }
}

/// Create AppState based on configuration
pub fn create_app_state(config: Config) -> Result<ConfiguredAppState> {
    let scraper: Arc<dyn LinkScraper> = Arc::from(scrape::from_config(&config.scraper)?);
    create_app_state_with_scraper(config, scraper)
}

/// Create AppState with an explicit scraper
pub fn create_app_state_with_scraper(
    config: Config,
    scraper: Arc<dyn LinkScraper>,
) -> Result<ConfiguredAppState> {
    tracing::info!("Creating AppState with storage type: {:?}", config.storage.storage_type);

    match config.storage.storage_type {
        StorageType::Memory => {
            let store = Arc::new(SimpleStore::new(SimpleStorage::new()));
            tracing::info!("SimpleStore initialized");
            let app_state = Arc::new(AppState::new(store, config, scraper));
            Ok(ConfiguredAppState::Memory { app_state })
        }
        StorageType::File => {
            let backend = FileStorage::open(&config.storage.data_dir)?;
            tracing::info!(path = %backend.path().display(), "FileStore initialized");
            let store = Arc::new(FileStore::new(backend));
            let app_state = Arc::new(AppState::new(store, config, scraper));
            Ok(ConfiguredAppState::File { app_state })
        }
    }
}
