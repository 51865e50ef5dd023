//! JSON snapshot storage
//!
//! Tables live in a [`SimpleStorage`]; every write rewrites
//! `<data_dir>/linkpage.json` through a temp file and a rename, so a crash
//! leaves either the old or the new snapshot on disk. A write whose snapshot
//! cannot be saved is rolled back in memory before the error is returned.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};

use crate::storage::{PageStorage, SimpleStorage, StorageSnapshot};
use crate::types::{Error, Post, PostId, Result, User, UserId, Userpage};

/// Snapshot file name inside the data directory
pub const SNAPSHOT_FILE: &str = "linkpage.json";

/// File-backed storage
pub struct FileStorage {
    tables: SimpleStorage,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Open (or create) the snapshot in `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(|e| {
            Error::storage(format!("Cannot create data directory {:?}: {}", data_dir, e))
        })?;

        let path = data_dir.join(SNAPSHOT_FILE);
        let tables = if path.exists() {
            let bytes = std::fs::read(&path)?;
            let snapshot: StorageSnapshot = serde_json::from_slice(&bytes)?;
            tracing::info!(
                path = %path.display(),
                users = snapshot.users.len(),
                pages = snapshot.pages.len(),
                posts = snapshot.posts.len(),
                "loaded storage snapshot"
            );
            SimpleStorage::from_snapshot(snapshot)
        } else {
            tracing::info!(path = %path.display(), "starting with empty storage");
            SimpleStorage::new()
        };

        Ok(Self {
            tables,
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Snapshot location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the snapshot; callers hold `write_lock`
    fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.tables.snapshot())?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &bytes)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                let _ = std::fs::remove_file(&tmp);
                tracing::error!(path = %self.path.display(), error = %e, "snapshot write failed");
                Error::storage(format!("Failed to write {:?}: {}", self.path, e))
            })
    }
}

impl PageStorage for FileStorage {
    fn get_user(&self, user_id: UserId) -> Option<User> {
        self.tables.get_user(user_id)
    }

    fn find_user(&self, username: &str) -> Option<User> {
        self.tables.find_user(username)
    }

    fn get_or_insert_user(&self, user: User) -> Result<User> {
        let _guard = self.write_lock.lock();
        let requested = user.id;
        let stored = self.tables.get_or_insert_user(user)?;
        if stored.id == requested {
            if let Err(e) = self.persist() {
                self.tables.remove_user(&stored);
                return Err(e);
            }
        }
        Ok(stored)
    }

    fn get_page(&self, user_id: UserId) -> Option<Userpage> {
        self.tables.get_page(user_id)
    }

    fn save_page(&self, page: Userpage) -> Result<()> {
        let _guard = self.write_lock.lock();
        let user_id = page.user_id;
        let previous = self.tables.get_page(user_id);
        self.tables.save_page(page)?;
        if let Err(e) = self.persist() {
            self.tables.restore_page(user_id, previous);
            return Err(e);
        }
        Ok(())
    }

    fn get_post(&self, post_id: PostId) -> Option<Post> {
        self.tables.get_post(post_id)
    }

    fn get_or_insert_post(&self, post: Post) -> Result<Post> {
        let _guard = self.write_lock.lock();
        let requested = post.id;
        let stored = self.tables.get_or_insert_post(post)?;
        if let (Some(post_id), true) = (stored.id, stored.id == requested) {
            if let Err(e) = self.persist() {
                self.tables.remove_post(post_id);
                return Err(e);
            }
        }
        Ok(stored)
    }

    fn collection(&self, user_id: UserId) -> Vec<PostId> {
        self.tables.collection(user_id)
    }

    fn add_to_collection(&self, user_id: UserId, post_id: PostId) -> Result<bool> {
        let _guard = self.write_lock.lock();
        let added = self.tables.add_to_collection(user_id, post_id)?;
        if added {
            if let Err(e) = self.persist() {
                self.tables.remove_from_collection(user_id, post_id);
                return Err(e);
            }
        }
        Ok(added)
    }

    fn recent_posts(&self, limit: usize) -> Vec<Post> {
        self.tables.recent_posts(limit)
    }

    fn user_count(&self) -> usize {
        self.tables.user_count()
    }

    fn page_count(&self) -> usize {
        self.tables.page_count()
    }

    fn post_count(&self) -> usize {
        self.tables.post_count()
    }
}
