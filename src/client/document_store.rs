//! Client-side mirror of the authoritative page

use arc_swap::ArcSwapOption;
use std::sync::Arc;

use crate::client::remote::RemoteService;
use crate::types::{Result, Userpage};

/// Last-known-good page for the logged-in user.
///
/// The cache only ever changes by whole-page replacement with something the
/// authority returned. Readers take a snapshot with [`DocumentStore::current`]
/// and never observe a half-applied edit.
pub struct DocumentStore {
    remote: Arc<dyn RemoteService>,
    cache: ArcSwapOption<Userpage>,
}

impl DocumentStore {
    /// Empty store backed by `remote`
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        Self {
            remote,
            cache: ArcSwapOption::empty(),
        }
    }

    /// Fetch the page from the authority and replace the cache.
    /// On failure the cache is left as it was.
    pub async fn load(&self) -> Result<Arc<Userpage>> {
        let page = self.remote.get_userpage().await?;
        tracing::debug!(page_id = %page.id, components = page.len(), "page loaded");
        Ok(self.replace(page))
    }

    /// Swap in a new page
    pub fn replace(&self, page: Userpage) -> Arc<Userpage> {
        let page = Arc::new(page);
        self.cache.store(Some(page.clone()));
        page
    }

    /// Snapshot of the cached page
    pub fn current(&self) -> Option<Arc<Userpage>> {
        self.cache.load_full()
    }

    /// Whether a page has been loaded
    pub fn is_loaded(&self) -> bool {
        self.cache.load().is_some()
    }

    /// Drop the cached page, e.g. after logout
    pub fn clear(&self) {
        self.cache.store(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::harness;
    use crate::types::{Component, Error, PageOp};
    use std::sync::atomic::Ordering;

    #[test]
    fn test_load_then_replace() {
        let remote = harness();
        let store = DocumentStore::new(remote.clone());
        assert!(store.current().is_none());

        let page = tokio_test::block_on(store.load()).unwrap();
        assert_eq!(store.current(), Some(page.clone()));

        let next = PageOp::Insert { index: 1, component: Component::divider() }
            .applied_to(&page)
            .unwrap();
        let swapped = store.replace(next.clone());
        assert_eq!(*swapped, next);
        assert_eq!(store.current().unwrap().len(), 2);

        store.clear();
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_failed_load_keeps_cache() {
        let remote = harness();
        let store = DocumentStore::new(remote.clone());
        let page = tokio_test::block_on(store.load()).unwrap();

        remote.fail_reads.store(true, Ordering::SeqCst);
        let err = tokio_test::block_on(store.load()).unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
        assert_eq!(store.current(), Some(page));
    }
}
