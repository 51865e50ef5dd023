//! Client core
//!
//! Everything an editing front end needs short of drawing pixels: a cached
//! copy of the page ([`DocumentStore`]), an edit queue that only commits
//! what the authority returns ([`EditController`]), the link ingestion flow
//! ([`PostIngestion`]) and a renderer producing escaped HTML.

pub mod document_store;
pub mod edit_controller;
pub mod http_remote;
pub mod ingestion;
pub mod local_remote;
pub mod remote;
pub mod renderer;

#[cfg(test)]
pub(crate) mod testing;

pub use document_store::DocumentStore;
pub use edit_controller::{EditController, Gesture};
pub use http_remote::HttpRemote;
pub use ingestion::{IngestState, PostIngestion};
pub use local_remote::InProcessRemote;
pub use remote::RemoteService;
pub use renderer::{render, render_page, RenderMode, RenderNode};

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{Post, PostId, PostSize, Result, Userpage};

/// One editing session: page cache, edit queue, ingestion and known posts
pub struct Editor {
    remote: Arc<dyn RemoteService>,
    store: Arc<DocumentStore>,
    controller: Arc<EditController>,
    ingestion: PostIngestion,
    posts: ArcSwap<HashMap<PostId, Post>>,
}

impl Editor {
    /// Session against `remote`; nothing is fetched yet
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        let store = Arc::new(DocumentStore::new(remote.clone()));
        let controller = Arc::new(EditController::new(remote.clone(), store.clone()));
        let ingestion = PostIngestion::new(remote.clone(), controller.clone());
        Self {
            remote,
            store,
            controller,
            ingestion,
            posts: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Load the page and the user's posts
    pub async fn open(&self) -> Result<Arc<Userpage>> {
        let page = self.store.load().await?;
        self.refresh_posts().await?;
        Ok(page)
    }

    /// Refetch the user's collection for card rendering
    pub async fn refresh_posts(&self) -> Result<()> {
        let posts = self.remote.user_posts().await?;
        self.posts.store(Arc::new(renderer::index_posts(&posts)));
        Ok(())
    }

    /// Page cache
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Edit queue
    pub fn controller(&self) -> &Arc<EditController> {
        &self.controller
    }

    /// Link ingestion flow
    pub fn ingestion(&self) -> &PostIngestion {
        &self.ingestion
    }

    /// Accept the pending post at `index`, keeping the card renderable.
    ///
    /// The stored post is remembered even when the insert fails.
    pub async fn accept_post(&self, index: usize, size: PostSize) -> Result<Arc<Userpage>> {
        let result = self.ingestion.accept(index, size).await;
        if let IngestState::Accepted { post } = self.ingestion.state() {
            if let Some(id) = post.id {
                self.posts.rcu(|known| {
                    let mut known = HashMap::clone(known);
                    known.insert(id, post.clone());
                    known
                });
            }
        }
        result
    }

    /// Render the cached page; empty before the first load
    pub fn view(&self, mode: RenderMode) -> Vec<RenderNode> {
        match self.store.current() {
            Some(page) => render_page(&page, &self.posts.load(), mode),
            None => Vec::new(),
        }
    }
}
