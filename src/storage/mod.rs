//! Storage layer for linkpage
//!
//! A [`PageStorage`] backend holds users, userpages, the global post table and
//! each user's post collection. [`Store`] wraps one backend and adds the
//! per-user spaces that serialize page edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Post, PostId, Result, User, UserId, Userpage};

/// In-memory DashMap backend
pub mod mem_simple;

/// JSON snapshot backend
pub mod file_store;

/// Per-user space (edit lock)
pub mod user_space;

/// Multi-user store over one backend
pub mod store;

pub use file_store::FileStorage;
pub use mem_simple::{SimpleStorage, StorageSnapshot};
pub use store::{FileStore, SimpleStore, Store};
pub use user_space::UserSpace;

/// Stored post with the time it entered the post table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// The post; `id` is always set once stored
    pub post: Post,
    /// Insertion time, orders the feed
    pub created_at: DateTime<Utc>,
}

/// Trait for page storage implementations
pub trait PageStorage: Send + Sync {
    /// Get a user by id
    fn get_user(&self, user_id: UserId) -> Option<User>;

    /// Get a user by username
    fn find_user(&self, username: &str) -> Option<User>;

    /// Insert `user` unless the username is taken; returns the stored user
    fn get_or_insert_user(&self, user: User) -> Result<User>;

    /// Get the page owned by `user_id`
    fn get_page(&self, user_id: UserId) -> Option<Userpage>;

    /// Create or replace the page owned by `page.user_id`
    fn save_page(&self, page: Userpage) -> Result<()>;

    /// Get a stored post
    fn get_post(&self, post_id: PostId) -> Option<Post>;

    /// Store `post` (which must carry an id) unless a post with the same url
    /// exists; returns the stored post either way
    fn get_or_insert_post(&self, post: Post) -> Result<Post>;

    /// Post ids in `user_id`'s collection, in the order they were added
    fn collection(&self, user_id: UserId) -> Vec<PostId>;

    /// Append to a collection; `false` if the post was already in it
    fn add_to_collection(&self, user_id: UserId, post_id: PostId) -> Result<bool>;

    /// Most recently stored posts, newest first
    fn recent_posts(&self, limit: usize) -> Vec<Post>;

    /// Number of registered users
    fn user_count(&self) -> usize;

    /// Number of stored pages
    fn page_count(&self) -> usize;

    /// Number of stored posts
    fn post_count(&self) -> usize;
}

/// Helper trait that combines all requirements for storage implementations
/// This cleans up generic bounds throughout the codebase
pub trait StorageImpl: PageStorage + Send + Sync + 'static {}

/// Blanket implementation for any type that meets the requirements
impl<T> StorageImpl for T where T: PageStorage + Send + Sync + 'static {}
