//! Test double for [`RemoteService`] with failure injection

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::client::local_remote::InProcessRemote;
use crate::client::remote::RemoteService;
use crate::core::{create_app_state_with_scraper, Config, ConfiguredAppState};
use crate::scrape::{LinkMetadata, StaticScraper};
use crate::types::{Component, Error, Post, Result, User, Userpage};

/// Url the harness scraper knows about
pub const KNOWN_URL: &str = "https://example.com/article";

/// In-process authority with switches for failing individual calls
pub struct ScriptedRemote {
    inner: Box<dyn RemoteService>,
    /// Fail every page mutation as unavailable
    pub fail_mutations: AtomicBool,
    /// Fail post persistence as unavailable
    pub fail_add_post: AtomicBool,
    /// Fail page fetches as unavailable
    pub fail_reads: AtomicBool,
    delay: Mutex<Option<Duration>>,
    mutations: AtomicUsize,
    concurrent: AtomicUsize,
    max_concurrent: AtomicUsize,
}

/// Logged-in remote over a fresh memory-backed authority
pub fn harness() -> Arc<ScriptedRemote> {
    let scraper = StaticScraper::new().with_page(
        KNOWN_URL,
        LinkMetadata {
            title: "An Article".into(),
            description: "About things".into(),
            site_name: "Example".into(),
            url: KNOWN_URL.into(),
            kind: "article".into(),
            ..Default::default()
        },
    );
    let state = match create_app_state_with_scraper(Config::default(), Arc::new(scraper)).unwrap() {
        ConfiguredAppState::Memory { app_state } => app_state,
        ConfiguredAppState::File { .. } => unreachable!("default config uses memory storage"),
    };
    let remote = InProcessRemote::login(state, "tester").unwrap();
    Arc::new(ScriptedRemote {
        inner: Box::new(remote),
        fail_mutations: AtomicBool::new(false),
        fail_add_post: AtomicBool::new(false),
        fail_reads: AtomicBool::new(false),
        delay: Mutex::new(None),
        mutations: AtomicUsize::new(0),
        concurrent: AtomicUsize::new(0),
        max_concurrent: AtomicUsize::new(0),
    })
}

impl ScriptedRemote {
    /// Successful or failed page mutations sent so far
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Most page mutations ever outstanding at once
    pub fn max_concurrent_mutations(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }

    /// Hold every page mutation for `delay`
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    async fn mutate<F>(&self, call: F) -> Result<Userpage>
    where
        F: std::future::Future<Output = Result<Userpage>> + Send,
    {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let result = if self.fail_mutations.load(Ordering::SeqCst) {
            Err(Error::unavailable("connection reset"))
        } else {
            call.await
        };

        self.concurrent.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl RemoteService for ScriptedRemote {
    async fn current_user(&self) -> Result<User> {
        self.inner.current_user().await
    }

    async fn get_userpage(&self) -> Result<Userpage> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::unavailable("connection reset"));
        }
        self.inner.get_userpage().await
    }

    async fn add_component(&self, index: usize, component: &Component) -> Result<Userpage> {
        self.mutate(self.inner.add_component(index, component)).await
    }

    async fn update_component(&self, index: usize, component: &Component) -> Result<Userpage> {
        self.mutate(self.inner.update_component(index, component)).await
    }

    async fn delete_component(&self, index: usize) -> Result<Userpage> {
        self.mutate(self.inner.delete_component(index)).await
    }

    async fn move_component(&self, prev_index: usize, new_index: usize) -> Result<Userpage> {
        self.mutate(self.inner.move_component(prev_index, new_index)).await
    }

    async fn create_post(&self, url: &str) -> Result<Post> {
        self.inner.create_post(url).await
    }

    async fn add_post(&self, post: &Post) -> Result<Post> {
        if self.fail_add_post.load(Ordering::SeqCst) {
            return Err(Error::unavailable("connection reset"));
        }
        self.inner.add_post(post).await
    }

    async fn user_posts(&self) -> Result<Vec<Post>> {
        self.inner.user_posts().await
    }

    async fn feed(&self) -> Result<Vec<Post>> {
        self.inner.feed().await
    }
}
