//! The remote authority as seen from the client

use async_trait::async_trait;

use crate::types::{Component, PageOp, Post, Result, User, Userpage};

/// Operations the client core needs from the authority.
///
/// Every page mutation answers with the whole page as the authority now has
/// it. Implementations report transport failures as `Unavailable` and pass
/// the authority's own failures through with their original kind.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// The logged-in user
    async fn current_user(&self) -> Result<User>;

    /// The caller's page
    async fn get_userpage(&self) -> Result<Userpage>;

    /// Insert `component` at `index`
    async fn add_component(&self, index: usize, component: &Component) -> Result<Userpage>;

    /// Replace the component at `index`
    async fn update_component(&self, index: usize, component: &Component) -> Result<Userpage>;

    /// Remove the component at `index`
    async fn delete_component(&self, index: usize) -> Result<Userpage>;

    /// Move the component at `prev_index` to `new_index`
    async fn move_component(&self, prev_index: usize, new_index: usize) -> Result<Userpage>;

    /// Scrape `url` into an unsaved post
    async fn create_post(&self, url: &str) -> Result<Post>;

    /// Persist a post into the caller's collection
    async fn add_post(&self, post: &Post) -> Result<Post>;

    /// The caller's collection
    async fn user_posts(&self) -> Result<Vec<Post>>;

    /// Public feed
    async fn feed(&self) -> Result<Vec<Post>>;

    /// Send a canonical operation
    async fn apply(&self, op: &PageOp) -> Result<Userpage> {
        match op {
            PageOp::Insert { index, component } => self.add_component(*index, component).await,
            PageOp::Update { index, component } => self.update_component(*index, component).await,
            PageOp::Delete { index } => self.delete_component(*index).await,
            PageOp::Move { prev_index, new_index } => self.move_component(*prev_index, *new_index).await,
        }
    }
}
