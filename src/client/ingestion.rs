//! Post ingestion flow
//!
//! `Idle -> Creating(url) -> Pending(post) -> Accepted(post) | Rejected`
//!
//! The flow owns no page state. Accepting a post persists it and then asks
//! the [`EditController`] to insert a post component, so the page only ever
//! changes through the same path as every other edit.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::client::edit_controller::EditController;
use crate::client::remote::RemoteService;
use crate::scrape::validate_url;
use crate::types::{Component, Error, Post, PostField, PostSize, Result, Userpage};

/// Where the flow currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestState {
    /// Nothing in progress
    Idle,
    /// Waiting on the scraper
    Creating {
        /// Submitted url
        url: String,
    },
    /// Scraped and awaiting the user's decision
    Pending {
        /// Unsaved post, editable
        post: Post,
    },
    /// Persisted
    Accepted {
        /// Stored post
        post: Post,
    },
    /// Discarded by the user
    Rejected,
}

impl IngestState {
    fn name(&self) -> &'static str {
        match self {
            IngestState::Idle => "idle",
            IngestState::Creating { .. } => "creating",
            IngestState::Pending { .. } => "pending",
            IngestState::Accepted { .. } => "accepted",
            IngestState::Rejected => "rejected",
        }
    }
}

/// Clears the busy flag when dropped
struct Busy<'a>(&'a AtomicBool);

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives one link at a time from url to post component
pub struct PostIngestion {
    remote: Arc<dyn RemoteService>,
    controller: Arc<EditController>,
    state: Mutex<IngestState>,
    busy: AtomicBool,
}

impl PostIngestion {
    /// Idle flow inserting through `controller`
    pub fn new(remote: Arc<dyn RemoteService>, controller: Arc<EditController>) -> Self {
        Self {
            remote,
            controller,
            state: Mutex::new(IngestState::Idle),
            busy: AtomicBool::new(false),
        }
    }

    /// Current state
    pub fn state(&self) -> IngestState {
        self.state.lock().clone()
    }

    /// The pending post, if any
    pub fn pending(&self) -> Option<Post> {
        match &*self.state.lock() {
            IngestState::Pending { post } => Some(post.clone()),
            _ => None,
        }
    }

    fn begin(&self) -> Result<Busy<'_>> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(Error::invalid_input("another ingestion step is in progress"));
        }
        Ok(Busy(&self.busy))
    }

    fn wrong_state(&self, action: &str) -> Error {
        Error::invalid_input(format!("cannot {} while {}", action, self.state.lock().name()))
    }

    /// Scrape `url` into a pending post.
    ///
    /// Any failure returns the flow to `Idle` with nothing created.
    pub async fn submit_url(&self, url: &str) -> Result<Post> {
        let _busy = self.begin()?;
        {
            let mut state = self.state.lock();
            if *state != IngestState::Idle {
                drop(state);
                return Err(self.wrong_state("submit a link"));
            }
            validate_url(url)?;
            *state = IngestState::Creating { url: url.trim().to_string() };
        }

        match self.remote.create_post(url).await {
            Ok(post) => {
                tracing::debug!(url = %post.url, title = %post.title, "link scraped");
                *self.state.lock() = IngestState::Pending { post: post.clone() };
                Ok(post)
            }
            Err(e) => {
                tracing::info!(url, error = %e, "link could not be scraped");
                *self.state.lock() = IngestState::Idle;
                Err(e)
            }
        }
    }

    /// Edit a field of the pending post; title and url are locked
    pub fn edit(&self, field: PostField, value: impl Into<String>) -> Result<Post> {
        let mut state = self.state.lock();
        if self.busy.load(Ordering::SeqCst) {
            let name = state.name();
            return Err(Error::invalid_input(format!("cannot edit a post while {} is being saved", name)));
        }
        match &mut *state {
            IngestState::Pending { post } => {
                post.set_field(field, value)?;
                Ok(post.clone())
            }
            other => Err(Error::invalid_input(format!("cannot edit a post while {}", other.name()))),
        }
    }

    /// Persist the pending post and insert it at `index`.
    ///
    /// If persisting fails the flow stays `Pending` so the user can retry.
    /// Once persisted the flow is `Accepted` even if the insert then fails;
    /// the post stays in the collection and the insert error is returned.
    pub async fn accept(&self, index: usize, size: PostSize) -> Result<Arc<Userpage>> {
        let _busy = self.begin()?;
        let post = match self.pending() {
            Some(post) => post,
            None => return Err(self.wrong_state("accept")),
        };

        let stored = self.remote.add_post(&post).await?;
        let post_id = stored
            .id
            .ok_or_else(|| Error::internal("authority returned a post without an id"))?;
        *self.state.lock() = IngestState::Accepted { post: stored };
        tracing::info!(post_id = %post_id, index, "post accepted");

        self.controller.insert(index, Component::post(post_id, size)).await
    }

    /// Discard the pending post
    pub fn reject(&self) -> Result<()> {
        let mut state = self.state.lock();
        if self.busy.load(Ordering::SeqCst) || !matches!(*state, IngestState::Pending { .. }) {
            let name = state.name();
            return Err(Error::invalid_input(format!("cannot reject while {}", name)));
        }
        *state = IngestState::Rejected;
        Ok(())
    }

    /// Back to `Idle` after a post was accepted or rejected
    pub fn reset(&self) -> Result<()> {
        let mut state = self.state.lock();
        match *state {
            IngestState::Accepted { .. } | IngestState::Rejected | IngestState::Idle => {
                *state = IngestState::Idle;
                Ok(())
            }
            ref other => Err(Error::invalid_input(format!("cannot reset while {}", other.name()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::document_store::DocumentStore;
    use crate::client::testing::{harness, ScriptedRemote, KNOWN_URL};

    async fn flow() -> (Arc<ScriptedRemote>, Arc<EditController>, PostIngestion) {
        let remote = harness();
        let store = Arc::new(DocumentStore::new(remote.clone()));
        store.load().await.unwrap();
        let controller = Arc::new(EditController::new(remote.clone(), store));
        let ingestion = PostIngestion::new(remote.clone(), controller.clone());
        (remote, controller, ingestion)
    }

    #[tokio::test]
    async fn test_accept_inserts_post_component() {
        let (remote, controller, ingestion) = flow().await;

        let post = ingestion.submit_url(KNOWN_URL).await.unwrap();
        assert_eq!(post.title, "An Article");
        assert!(post.id.is_none());
        assert!(matches!(ingestion.state(), IngestState::Pending { .. }));

        ingestion.edit(PostField::Author, "Ada").unwrap();
        assert!(matches!(ingestion.edit(PostField::Title, "Other"), Err(Error::InvalidInput(_))));

        let page = ingestion.accept(1, PostSize::Medium).await.unwrap();
        let stored = match ingestion.state() {
            IngestState::Accepted { post } => post,
            other => panic!("unexpected state {:?}", other),
        };
        assert_eq!(stored.author, "Ada");
        let post_id = stored.id.unwrap();
        assert_eq!(page.components[1], Component::post(post_id, PostSize::Medium));
        assert_eq!(controller.store().current().unwrap(), page);
        assert_eq!(remote.user_posts().await.unwrap(), vec![stored]);

        ingestion.reset().unwrap();
        assert_eq!(ingestion.state(), IngestState::Idle);
    }

    #[tokio::test]
    async fn test_scrape_failure_returns_to_idle() {
        let (remote, controller, ingestion) = flow().await;
        let before = controller.store().current().unwrap();

        let err = ingestion.submit_url("https://unknown.example.org").await.unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert_eq!(ingestion.state(), IngestState::Idle);

        assert!(matches!(ingestion.submit_url("   ").await, Err(Error::InvalidInput(_))));
        assert_eq!(ingestion.state(), IngestState::Idle);

        assert_eq!(controller.store().current().unwrap(), before);
        assert!(remote.user_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_stays_pending() {
        let (remote, _controller, ingestion) = flow().await;
        ingestion.submit_url(KNOWN_URL).await.unwrap();

        remote.fail_add_post.store(true, Ordering::SeqCst);
        let err = ingestion.accept(0, PostSize::Small).await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
        assert!(matches!(ingestion.state(), IngestState::Pending { .. }));

        remote.fail_add_post.store(false, Ordering::SeqCst);
        ingestion.accept(0, PostSize::Small).await.unwrap();
        assert!(matches!(ingestion.state(), IngestState::Accepted { .. }));
    }

    #[tokio::test]
    async fn test_insert_failure_after_persist_is_accepted() {
        let (remote, controller, ingestion) = flow().await;
        let before = controller.store().current().unwrap();
        ingestion.submit_url(KNOWN_URL).await.unwrap();

        let err = ingestion.accept(7, PostSize::Medium).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(matches!(ingestion.state(), IngestState::Accepted { .. }));
        assert_eq!(remote.user_posts().await.unwrap().len(), 1);
        assert_eq!(controller.store().current().unwrap(), before);
    }

    #[tokio::test]
    async fn test_edits_refused_while_saving() {
        let (_remote, _controller, ingestion) = flow().await;
        ingestion.submit_url(KNOWN_URL).await.unwrap();

        let _saving = ingestion.begin().unwrap();
        assert!(matches!(ingestion.edit(PostField::Author, "Ada"), Err(Error::InvalidInput(_))));
        assert!(ingestion.reject().is_err());
        drop(_saving);

        assert_eq!(ingestion.edit(PostField::Author, "Ada").unwrap().author, "Ada");
    }

    #[tokio::test]
    async fn test_reject_persists_nothing() {
        let (remote, _controller, ingestion) = flow().await;
        assert!(ingestion.reject().is_err());
        assert!(ingestion.accept(0, PostSize::Small).await.is_err());

        ingestion.submit_url(KNOWN_URL).await.unwrap();
        assert!(ingestion.submit_url(KNOWN_URL).await.is_err());
        ingestion.reject().unwrap();
        assert_eq!(ingestion.state(), IngestState::Rejected);
        assert!(ingestion.pending().is_none());
        assert!(remote.user_posts().await.unwrap().is_empty());

        ingestion.reset().unwrap();
        assert_eq!(ingestion.state(), IngestState::Idle);
    }
}
