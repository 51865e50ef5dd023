//! Users and sessions
//!
//! Identity is a username; logging in registers the name on first use and
//! issues an opaque bearer token. Requests carry the token in an
//! `Authorization: Bearer` header or a `session` cookie.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::storage::{PageStorage, Store};
use crate::types::{user, Error, Result, User, UserId};

/// Session tokens
pub mod session;

pub use session::{Session, SessionStore};

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Body of a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,
    /// Logged-in user
    pub user: User,
}

/// Login, logout and token resolution
pub struct AccountService<S: PageStorage + 'static> {
    store: Arc<Store<S>>,
    sessions: SessionStore,
}

impl<S: PageStorage + 'static> AccountService<S> {
    /// Create the service
    pub fn new(store: Arc<Store<S>>, sessions: SessionStore) -> Self {
        Self { store, sessions }
    }

    /// Log in as `username`, registering it if unknown
    pub fn login(&self, username: &str) -> Result<LoginResponse> {
        let username = user::normalize_username(username)?;
        let user = match self.store.backend().find_user(&username) {
            Some(user) => user,
            None => self.store.backend().get_or_insert_user(User::new(&username)?)?,
        };
        let token = self.sessions.issue(user.id);
        tracing::info!(user_id = %user.id, username = %user.username, "user logged in");
        Ok(LoginResponse { token, user })
    }

    /// User owning `token`
    pub fn authenticate(&self, token: &str) -> Result<User> {
        let user_id = self.sessions.resolve(token)?;
        self.user(user_id)
    }

    /// Look up a user by id
    pub fn user(&self, user_id: UserId) -> Result<User> {
        self.store.backend().get_user(user_id).ok_or(Error::Unauthenticated)
    }

    /// End a session
    pub fn logout(&self, token: &str) {
        if self.sessions.revoke(token) {
            tracing::info!("session revoked");
        }
    }

    /// The session table
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

/// Pull a session token out of request headers
pub fn token_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    use axum::http::header::{AUTHORIZATION, COOKIE};

    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
