//! Page processor - authoritative application of page operations

use std::sync::Arc;

use crate::storage::{PageStorage, Store};
use crate::system::metrics;
use crate::types::{PageOp, Result, UserId, Userpage};

/// Applies canonical operations to stored pages.
///
/// Every read-modify-write runs under the owner's [`UserSpace`] lock, so
/// concurrent edits of one page are applied one after another and each
/// caller gets back the page its own operation produced.
///
/// [`UserSpace`]: crate::storage::UserSpace
pub struct PageProcessor<S: PageStorage + 'static> {
    store: Arc<Store<S>>,
}

impl<S: PageStorage + 'static> PageProcessor<S> {
    /// Create a processor over `store`
    pub fn new(store: Arc<Store<S>>) -> Self {
        Self { store }
    }

    /// The user's page, created with the default header on first access
    pub fn get_or_create(&self, user_id: UserId) -> Result<Userpage> {
        if let Some(page) = self.store.backend().get_page(user_id) {
            return Ok(page);
        }

        let space = self.store.space(user_id);
        let _guard = space.lock();
        self.load_or_create_locked(user_id)
    }

    /// Apply `op` to the user's page and return the new page.
    ///
    /// On any error nothing is persisted.
    pub fn apply(&self, user_id: UserId, op: &PageOp) -> Result<Userpage> {
        let timer = metrics::page_op_timer(op.name());
        let space = self.store.space(user_id);

        let result = {
            let _guard = space.lock();
            self.load_or_create_locked(user_id).and_then(|page| {
                let next = op.applied_to(&page)?;
                self.store.backend().save_page(next.clone())?;
                Ok(next)
            })
        };

        timer.finish();
        metrics::record_page_op(op.name(), result.is_ok());
        match &result {
            Ok(page) => tracing::info!(
                user_id = %user_id,
                op = op.name(),
                components = page.len(),
                "page operation applied"
            ),
            Err(e) => tracing::warn!(user_id = %user_id, op = op.name(), error = %e, "page operation rejected"),
        }
        result
    }

    fn load_or_create_locked(&self, user_id: UserId) -> Result<Userpage> {
        if let Some(page) = self.store.backend().get_page(user_id) {
            return Ok(page);
        }
        let page = Userpage::with_default_header(user_id);
        self.store.backend().save_page(page.clone())?;
        metrics::record_page_created();
        tracing::info!(user_id = %user_id, page_id = %page.id, "created default page");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SimpleStorage, SimpleStore};
    use crate::types::{Component, Error, HeaderSize};

    fn processor() -> PageProcessor<SimpleStorage> {
        PageProcessor::new(Arc::new(SimpleStore::new(SimpleStorage::new())))
    }

    #[test]
    fn test_first_access_creates_default_page() {
        let pages = processor();
        let user = UserId::random();
        let page = pages.get_or_create(user).unwrap();
        assert_eq!(page.user_id, user);
        assert_eq!(page.components, vec![Component::header("My Page", HeaderSize::LARGE)]);
        assert_eq!(pages.get_or_create(user).unwrap().id, page.id);
    }

    #[test]
    fn test_apply_persists_and_failures_do_not() {
        let pages = processor();
        let user = UserId::random();

        let page = pages
            .apply(user, &PageOp::Insert { index: 1, component: Component::paragraph("hello") })
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(pages.get_or_create(user).unwrap(), page);

        let err = pages.apply(user, &PageOp::Delete { index: 7 }).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(pages.get_or_create(user).unwrap(), page);
    }

    #[test]
    fn test_unsaved_file_write_keeps_previous_page() {
        use crate::storage::{FileStorage, FileStore};

        let dir = tempfile::tempdir().unwrap();
        let backend = FileStorage::open(dir.path()).unwrap();
        let snapshot = backend.path().to_path_buf();
        let pages = PageProcessor::new(Arc::new(FileStore::new(backend)));
        let user = UserId::random();
        let before = pages.get_or_create(user).unwrap();

        std::fs::remove_file(&snapshot).unwrap();
        std::fs::create_dir(&snapshot).unwrap();
        std::fs::write(snapshot.join("occupied"), b"x").unwrap();

        let err = pages
            .apply(user, &PageOp::Insert { index: 0, component: Component::divider() })
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(pages.get_or_create(user).unwrap(), before);
    }

    #[test]
    fn test_concurrent_inserts_are_all_applied() {
        let pages = Arc::new(processor());
        let user = UserId::random();
        pages.get_or_create(user).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pages = pages.clone();
                std::thread::spawn(move || {
                    pages
                        .apply(user, &PageOp::Insert { index: 1, component: Component::paragraph(i.to_string()) })
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pages.get_or_create(user).unwrap().len(), 9);
    }
}
