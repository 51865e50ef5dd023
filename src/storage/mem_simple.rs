//! Simple in-memory storage implementation using DashMap
//!
//! Secondary indexes (username → user, url → post) are kept next to the
//! primary tables and updated through DashMap entries so lookups and
//! dedupe are atomic per key.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::storage::{PageStorage, PostRecord};
use crate::types::{Error, Post, PostId, Result, User, UserId, Userpage};

/// Simple storage implementation using DashMap
#[derive(Default)]
pub struct SimpleStorage {
    users: DashMap<UserId, User>,
    usernames: DashMap<String, UserId>,
    pages: DashMap<UserId, Userpage>,
    posts: DashMap<PostId, PostRecord>,
    post_urls: DashMap<String, PostId>,
    collections: DashMap<UserId, Vec<PostId>>,
}

/// Serializable copy of every table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSnapshot {
    /// Users
    pub users: Vec<User>,
    /// Pages
    pub pages: Vec<Userpage>,
    /// Posts with insertion times
    pub posts: Vec<PostRecord>,
    /// Collections keyed by owner
    pub collections: Vec<(UserId, Vec<PostId>)>,
}

impl SimpleStorage {
    /// Create a new SimpleStorage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild tables and indexes from a snapshot
    pub fn from_snapshot(snapshot: StorageSnapshot) -> Self {
        let storage = Self::new();
        for user in snapshot.users {
            storage.usernames.insert(user.username.clone(), user.id);
            storage.users.insert(user.id, user);
        }
        for page in snapshot.pages {
            storage.pages.insert(page.user_id, page);
        }
        for record in snapshot.posts {
            if let Some(id) = record.post.id {
                storage.post_urls.insert(record.post.url.clone(), id);
                storage.posts.insert(id, record);
            }
        }
        for (user_id, post_ids) in snapshot.collections {
            storage.collections.insert(user_id, post_ids);
        }
        storage
    }

    /// Copy every table
    pub fn snapshot(&self) -> StorageSnapshot {
        let mut posts: Vec<PostRecord> = self.posts.iter().map(|r| r.value().clone()).collect();
        posts.sort_by_key(|record| record.created_at);

        StorageSnapshot {
            users: self.users.iter().map(|r| r.value().clone()).collect(),
            pages: self.pages.iter().map(|r| r.value().clone()).collect(),
            posts,
            collections: self
                .collections
                .iter()
                .map(|r| (*r.key(), r.value().clone()))
                .collect(),
        }
    }

    /// Put back the page `user_id` had before a failed write
    pub(crate) fn restore_page(&self, user_id: UserId, previous: Option<Userpage>) {
        match previous {
            Some(page) => {
                self.pages.insert(user_id, page);
            }
            None => {
                self.pages.remove(&user_id);
            }
        }
    }

    /// Drop a user registered by a failed write
    pub(crate) fn remove_user(&self, user: &User) {
        self.usernames.remove_if(&user.username, |_, id| *id == user.id);
        self.users.remove(&user.id);
    }

    /// Drop a post stored by a failed write
    pub(crate) fn remove_post(&self, post_id: PostId) {
        if let Some((_, record)) = self.posts.remove(&post_id) {
            self.post_urls.remove_if(&record.post.url, |_, id| *id == post_id);
        }
    }

    /// Undo an `add_to_collection` that returned true
    pub(crate) fn remove_from_collection(&self, user_id: UserId, post_id: PostId) {
        if let Some(mut ids) = self.collections.get_mut(&user_id) {
            ids.retain(|id| *id != post_id);
        }
    }
}

impl PageStorage for SimpleStorage {
    fn get_user(&self, user_id: UserId) -> Option<User> {
        self.users.get(&user_id).map(|user| user.clone())
    }

    fn find_user(&self, username: &str) -> Option<User> {
        let user_id = *self.usernames.get(username)?;
        self.get_user(user_id)
    }

    fn get_or_insert_user(&self, user: User) -> Result<User> {
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(existing) => self
                .get_user(*existing.get())
                .ok_or_else(|| Error::storage(format!("username index points at missing user {}", existing.get()))),
            Entry::Vacant(slot) => {
                tracing::debug!(user_id = %user.id, username = %user.username, "registering user");
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    fn get_page(&self, user_id: UserId) -> Option<Userpage> {
        self.pages.get(&user_id).map(|page| page.clone())
    }

    fn save_page(&self, page: Userpage) -> Result<()> {
        self.pages.insert(page.user_id, page);
        Ok(())
    }

    fn get_post(&self, post_id: PostId) -> Option<Post> {
        self.posts.get(&post_id).map(|record| record.post.clone())
    }

    fn get_or_insert_post(&self, post: Post) -> Result<Post> {
        let post_id = post
            .id
            .ok_or_else(|| Error::storage("cannot store a post without an id"))?;

        match self.post_urls.entry(post.url.clone()) {
            Entry::Occupied(existing) => {
                let stored = self.get_post(*existing.get()).ok_or_else(|| {
                    Error::storage(format!("url index points at missing post {}", existing.get()))
                })?;
                tracing::debug!(url = %post.url, post_id = %existing.get(), "reusing stored post");
                Ok(stored)
            }
            Entry::Vacant(slot) => {
                self.posts.insert(
                    post_id,
                    PostRecord {
                        post: post.clone(),
                        created_at: Utc::now(),
                    },
                );
                slot.insert(post_id);
                Ok(post)
            }
        }
    }

    fn collection(&self, user_id: UserId) -> Vec<PostId> {
        self.collections
            .get(&user_id)
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }

    fn add_to_collection(&self, user_id: UserId, post_id: PostId) -> Result<bool> {
        let mut ids = self.collections.entry(user_id).or_default();
        if ids.contains(&post_id) {
            return Ok(false);
        }
        ids.push(post_id);
        Ok(true)
    }

    fn recent_posts(&self, limit: usize) -> Vec<Post> {
        let mut records: Vec<PostRecord> = self.posts.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.into_iter().take(limit).map(|record| record.post).collect()
    }

    fn user_count(&self) -> usize {
        self.users.len()
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn post_count(&self) -> usize {
        self.posts.len()
    }
}
