//! In-process [`RemoteService`] bound to one user

use async_trait::async_trait;
use std::sync::Arc;

use crate::client::remote::RemoteService;
use crate::core::AppState;
use crate::storage::StorageImpl;
use crate::types::{Component, PageOp, Post, Result, User, UserId, Userpage};

/// Calls the authority's services directly, without HTTP
pub struct InProcessRemote<S: StorageImpl> {
    state: Arc<AppState<S>>,
    user_id: UserId,
}

impl<S: StorageImpl> InProcessRemote<S> {
    /// Act as `user_id` against `state`
    pub fn new(state: Arc<AppState<S>>, user_id: UserId) -> Self {
        Self { state, user_id }
    }

    /// Log in as `username` and act as that user
    pub fn login(state: Arc<AppState<S>>, username: &str) -> Result<Self> {
        let login = state.accounts.login(username)?;
        Ok(Self::new(state, login.user.id))
    }

    fn apply_op(&self, op: PageOp) -> Result<Userpage> {
        self.state.pages.apply(self.user_id, &op)
    }
}

#[async_trait]
impl<S: StorageImpl> RemoteService for InProcessRemote<S> {
    async fn current_user(&self) -> Result<User> {
        self.state.accounts.user(self.user_id)
    }

    async fn get_userpage(&self) -> Result<Userpage> {
        self.state.pages.get_or_create(self.user_id)
    }

    async fn add_component(&self, index: usize, component: &Component) -> Result<Userpage> {
        self.apply_op(PageOp::Insert { index, component: component.clone() })
    }

    async fn update_component(&self, index: usize, component: &Component) -> Result<Userpage> {
        self.apply_op(PageOp::Update { index, component: component.clone() })
    }

    async fn delete_component(&self, index: usize) -> Result<Userpage> {
        self.apply_op(PageOp::Delete { index })
    }

    async fn move_component(&self, prev_index: usize, new_index: usize) -> Result<Userpage> {
        self.apply_op(PageOp::Move { prev_index, new_index })
    }

    async fn create_post(&self, url: &str) -> Result<Post> {
        self.state.posts.create_post(url).await
    }

    async fn add_post(&self, post: &Post) -> Result<Post> {
        self.state.posts.add_post(self.user_id, post.clone())
    }

    async fn user_posts(&self) -> Result<Vec<Post>> {
        Ok(self.state.posts.user_posts(self.user_id))
    }

    async fn feed(&self) -> Result<Vec<Post>> {
        Ok(self.state.posts.feed())
    }
}
