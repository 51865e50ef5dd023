//! User space - per-user edit serialization

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};

use crate::types::UserId;

/// One user's slice of the store.
///
/// Holding [`UserSpace::lock`] is what makes a page read-modify-write atomic:
/// two edits against the same page never interleave, while edits of different
/// users proceed in parallel.
pub struct UserSpace {
    /// The user ID this space represents
    user_id: UserId,
    /// Serializes page edits
    edit_lock: Mutex<()>,
    /// When this space was first touched in this process
    opened_at: DateTime<Utc>,
}

impl UserSpace {
    /// Create a new space for a specific user
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            edit_lock: Mutex::new(()),
            opened_at: Utc::now(),
        }
    }

    /// Get the user ID this space represents
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// First access time
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Acquire the edit lock
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.edit_lock.lock()
    }
}
