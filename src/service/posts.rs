//! Post service - scraping, storing and listing posts

use std::sync::Arc;

use crate::scrape::{self, LinkScraper};
use crate::storage::{PageStorage, Store};
use crate::system::metrics;
use crate::types::{Error, Post, PostId, Result, UserId};

/// Number of posts returned by the public feed
pub const FEED_LIMIT: usize = 50;

/// Post ingestion on the authority side
pub struct PostService<S: PageStorage + 'static> {
    store: Arc<Store<S>>,
    scraper: Arc<dyn LinkScraper>,
}

impl<S: PageStorage + 'static> PostService<S> {
    /// Create a service over `store` using `scraper` for link previews
    pub fn new(store: Arc<Store<S>>, scraper: Arc<dyn LinkScraper>) -> Self {
        Self { store, scraper }
    }

    /// Scrape `url` into an unsaved post. Nothing is stored.
    pub async fn create_post(&self, url: &str) -> Result<Post> {
        let result = scrape::scrape_post(self.scraper.as_ref(), url).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(Error::InvalidInput(_)) => "invalid_input",
            Err(Error::Unsupported(_)) => "unsupported",
            Err(_) => "unavailable",
        };
        metrics::record_scrape(outcome);
        if let Err(e) = &result {
            tracing::warn!(url = %url, error = %e, "link scrape failed");
        }
        result
    }

    /// Persist `post` and add it to the user's collection.
    ///
    /// A post whose url is already stored is not duplicated; the stored one
    /// is added to the collection and returned.
    pub fn add_post(&self, user_id: UserId, post: Post) -> Result<Post> {
        post.validate()?;
        let url = scrape::validate_url(&post.url)?;

        let candidate = Post {
            id: Some(PostId::random()),
            url: url.to_string(),
            ..post
        };
        let requested_id = candidate.id;
        let stored = self.store.backend().get_or_insert_post(candidate)?;
        let post_id = stored
            .id
            .ok_or_else(|| Error::internal("stored post has no id"))?;
        let added = self.store.backend().add_to_collection(user_id, post_id)?;

        let newly_stored = stored.id == requested_id;
        metrics::record_post_added(newly_stored, added);
        tracing::info!(
            user_id = %user_id,
            post_id = %post_id,
            url = %stored.url,
            newly_stored,
            "post added to collection"
        );
        Ok(stored)
    }

    /// Posts in the user's collection, oldest first
    pub fn user_posts(&self, user_id: UserId) -> Vec<Post> {
        let backend = self.store.backend();
        backend
            .collection(user_id)
            .into_iter()
            .filter_map(|post_id| backend.get_post(post_id))
            .collect()
    }

    /// A single stored post
    pub fn get_post(&self, post_id: PostId) -> Result<Post> {
        self.store
            .backend()
            .get_post(post_id)
            .ok_or_else(|| Error::not_found(format!("post {}", post_id)))
    }

    /// Public feed: stored posts, newest first
    pub fn feed(&self) -> Vec<Post> {
        self.store.backend().recent_posts(FEED_LIMIT)
    }
}
