//! Application State Management
//!
//! This module defines the central AppState that holds all application services.
//! It is built by the factory and shared with every request handler.

use std::sync::Arc;
use std::time::Instant;

use crate::auth::{AccountService, SessionStore};
use crate::core::config::Config;
use crate::scrape::LinkScraper;
use crate::service::{PageProcessor, PostService};
use crate::storage::{StorageImpl, Store};

/// Central application state holding all services
pub struct AppState<S: StorageImpl> {
    /// Storage system - configured Store instance
    pub store: Arc<Store<S>>,

    /// Application configuration
    pub config: Config,

    /// Page operations
    pub pages: PageProcessor<S>,

    /// Post ingestion and listing
    pub posts: PostService<S>,

    /// Users and sessions
    pub accounts: AccountService<S>,

    /// Process start, reported by `/health`
    pub started_at: Instant,
}

impl<S: StorageImpl> AppState<S> {
    /// Create a new AppState with the given configuration
    /// This is called by the factory after the store and scraper are built
    pub fn new(store: Arc<Store<S>>, config: Config, scraper: Arc<dyn LinkScraper>) -> Self {
        let sessions = SessionStore::new(config.auth.session_ttl);
        Self {
            pages: PageProcessor::new(store.clone()),
            posts: PostService::new(store.clone(), scraper),
            accounts: AccountService::new(store.clone(), sessions),
            store,
            config,
            started_at: Instant::now(),
        }
    }
}
