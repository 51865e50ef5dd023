//! Store - one storage backend plus per-user spaces

use dashmap::DashMap;
use std::sync::Arc;

use crate::storage::user_space::UserSpace;
use crate::storage::{FileStorage, PageStorage, SimpleStorage};
use crate::types::UserId;

/// Maps users to their isolated spaces over a shared backend.
///
/// Generic parameter S allows compile-time selection of the storage
/// implementation.
pub struct Store<S: PageStorage + 'static> {
    /// Backend holding every table
    backend: S,
    /// Lock-free map of user ID to UserSpace instances
    user_spaces: DashMap<UserId, Arc<UserSpace>>,
}

impl<S: PageStorage + 'static> Store<S> {
    /// Create a store over `backend`
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            user_spaces: DashMap::new(),
        }
    }

    /// The storage backend
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Get or create the space for a specific user
    pub fn space(&self, user_id: UserId) -> Arc<UserSpace> {
        self.user_spaces
            .entry(user_id)
            .or_insert_with(|| Arc::new(UserSpace::new(user_id)))
            .clone()
    }

    /// Number of users that touched the store in this process
    pub fn active_user_count(&self) -> usize {
        self.user_spaces.len()
    }
}

/// Type alias for Store with SimpleStorage
pub type SimpleStore = Store<SimpleStorage>;
/// Type alias for Store with FileStorage
pub type FileStore = Store<FileStorage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_is_shared_per_user() {
        let store = SimpleStore::new(SimpleStorage::new());
        let user = UserId::random();
        let a = store.space(user);
        let b = store.space(user);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.user_id(), user);

        store.space(UserId::random());
        assert_eq!(store.active_user_count(), 2);
    }
}
