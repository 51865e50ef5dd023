//! Edit controller - gestures to canonical operations
//!
//! Every edit goes through the authority: the controller checks the
//! operation against the cached page, sends it, and commits the page that
//! comes back. Nothing is applied locally ahead of the response, and a failed
//! call leaves the cache exactly as it was.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::document_store::DocumentStore;
use crate::client::remote::RemoteService;
use crate::types::{
    Component, ComponentKind, Error, HeaderSize, PageOp, PostId, PostSize, Result, Userpage,
};

/// A user interaction on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    /// "+" menu: insert the default component of `kind` at `index`
    AddComponent {
        /// Insert position
        index: usize,
        /// Header, paragraph or divider
        kind: ComponentKind,
    },
    /// Insert a card for a stored post
    AddPost {
        /// Insert position
        index: usize,
        /// Stored post
        post_id: PostId,
        /// Card size
        size: PostSize,
    },
    /// Text captured from an editable header or paragraph
    EditText {
        /// Edited component
        index: usize,
        /// New text
        content: String,
    },
    /// Header size picker
    ResizeHeader {
        /// Header position
        index: usize,
        /// New size
        size: HeaderSize,
    },
    /// Post card size picker
    ResizePost {
        /// Post position
        index: usize,
        /// New size
        size: PostSize,
    },
    /// Drag and drop
    Drag {
        /// Position the drag started at
        from: usize,
        /// Drop position
        to: usize,
    },
    /// Delete button
    Remove {
        /// Removed position
        index: usize,
    },
}

impl Gesture {
    /// Operation this gesture produces on `page`; `None` when it changes nothing
    pub fn to_op(&self, page: &Userpage) -> Result<Option<PageOp>> {
        let op = match self {
            Gesture::AddComponent { index, kind } => PageOp::Insert {
                index: *index,
                component: Component::default_for(*kind)?,
            },
            Gesture::AddPost { index, post_id, size } => PageOp::Insert {
                index: *index,
                component: Component::post(*post_id, *size),
            },
            Gesture::EditText { index, content } => {
                let existing = page.component(*index)?;
                if existing.text() == Some(content.as_str()) {
                    return Ok(None);
                }
                PageOp::Update { index: *index, component: existing.with_text(content.clone())? }
            }
            Gesture::ResizeHeader { index, size } => match page.component(*index)? {
                Component::Header(header) if header.size == *size => return Ok(None),
                Component::Header(header) => PageOp::Update {
                    index: *index,
                    component: Component::header(header.content.clone(), *size),
                },
                other => return Err(not_a(ComponentKind::Header, other)),
            },
            Gesture::ResizePost { index, size } => match page.component(*index)? {
                Component::Post(post) if post.size == *size => return Ok(None),
                Component::Post(post) => PageOp::Update {
                    index: *index,
                    component: Component::post(post.post_id, *size),
                },
                other => return Err(not_a(ComponentKind::Post, other)),
            },
            Gesture::Drag { from, to } if from == to => return Ok(None),
            Gesture::Drag { from, to } => PageOp::Move { prev_index: *from, new_index: *to },
            Gesture::Remove { index } => PageOp::Delete { index: *index },
        };
        Ok(Some(op))
    }
}

fn not_a(expected: ComponentKind, found: &Component) -> Error {
    Error::invalid_input(format!("expected a {} component, found a {}", expected, found.kind()))
}

/// Decrements the outstanding count when dropped
struct Outstanding<'a>(&'a AtomicUsize);

impl<'a> Outstanding<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Outstanding(counter)
    }
}

impl Drop for Outstanding<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serializes edits against the authority and commits their results
pub struct EditController {
    remote: Arc<dyn RemoteService>,
    store: Arc<DocumentStore>,
    queue: Mutex<()>,
    outstanding: AtomicUsize,
}

impl EditController {
    /// Controller committing into `store`
    pub fn new(remote: Arc<dyn RemoteService>, store: Arc<DocumentStore>) -> Self {
        Self {
            remote,
            store,
            queue: Mutex::new(()),
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Whether an edit is queued or waiting on the authority
    pub fn in_flight(&self) -> bool {
        self.outstanding.load(Ordering::SeqCst) > 0
    }

    /// The page store this controller commits into
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Send `op` and commit the page the authority returns
    pub async fn apply(&self, op: PageOp) -> Result<Arc<Userpage>> {
        let _outstanding = Outstanding::enter(&self.outstanding);
        let _turn = self.queue.lock().await;
        let page = self.cached_or_load().await?;
        self.send(&page, op).await
    }

    /// Translate `gesture` against the current page and apply it.
    /// Gestures that change nothing return the cached page without a request.
    pub async fn handle(&self, gesture: Gesture) -> Result<Arc<Userpage>> {
        let _outstanding = Outstanding::enter(&self.outstanding);
        let _turn = self.queue.lock().await;
        let page = self.cached_or_load().await?;
        match gesture.to_op(&page)? {
            Some(op) => self.send(&page, op).await,
            None => Ok(page),
        }
    }

    /// Insert `component` at `index`
    pub async fn insert(&self, index: usize, component: Component) -> Result<Arc<Userpage>> {
        self.apply(PageOp::Insert { index, component }).await
    }

    /// Replace the component at `index`
    pub async fn update(&self, index: usize, component: Component) -> Result<Arc<Userpage>> {
        self.apply(PageOp::Update { index, component }).await
    }

    /// Remove the component at `index`
    pub async fn delete(&self, index: usize) -> Result<Arc<Userpage>> {
        self.apply(PageOp::Delete { index }).await
    }

    /// Move the component at `prev_index` to `new_index`
    pub async fn move_component(&self, prev_index: usize, new_index: usize) -> Result<Arc<Userpage>> {
        self.apply(PageOp::Move { prev_index, new_index }).await
    }

    async fn cached_or_load(&self) -> Result<Arc<Userpage>> {
        match self.store.current() {
            Some(page) => Ok(page),
            None => self.store.load().await,
        }
    }

    async fn send(&self, page: &Userpage, op: PageOp) -> Result<Arc<Userpage>> {
        op.check(&page.components)?;
        tracing::debug!(op = op.name(), "sending page operation");
        match self.remote.apply(&op).await {
            Ok(next) => Ok(self.store.replace(next)),
            Err(e) => {
                tracing::warn!(op = op.name(), error = %e, "page operation failed");
                Err(e)
            }
        }
    }
}
