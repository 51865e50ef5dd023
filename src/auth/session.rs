//! Opaque bearer sessions

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

use crate::system::metrics;
use crate::types::{Error, Result, UserId};

/// An issued session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Session owner
    pub user_id: UserId,
    /// Instant after which the token is refused
    pub expires_at: DateTime<Utc>,
}

/// Expired sessions are swept on every this many issued tokens
pub const PURGE_EVERY: usize = 64;

/// In-memory token table
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: chrono::Duration,
    issued: AtomicUsize,
}

impl SessionStore {
    /// Create a store issuing tokens valid for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            issued: AtomicUsize::new(0),
        }
    }

    /// Issue a new token for `user_id`
    pub fn issue(&self, user_id: UserId) -> String {
        if self.issued.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1 {
            self.purge_expired();
        }

        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.sessions.insert(token.clone(), Session { user_id, expires_at });
        metrics::record_session(1);
        token
    }

    /// Owner of a live token. Expired tokens are dropped on sight.
    pub fn resolve(&self, token: &str) -> Result<UserId> {
        let session = self
            .sessions
            .get(token)
            .map(|s| s.clone())
            .ok_or(Error::Unauthenticated)?;

        if session.expires_at <= Utc::now() {
            if self.sessions.remove(token).is_some() {
                metrics::record_session(-1);
            }
            tracing::debug!(user_id = %session.user_id, "session expired");
            return Err(Error::Unauthenticated);
        }
        Ok(session.user_id)
    }

    /// Forget a token; `false` if it was unknown
    pub fn revoke(&self, token: &str) -> bool {
        let removed = self.sessions.remove(token).is_some();
        if removed {
            metrics::record_session(-1);
        }
        removed
    }

    /// Drop every expired session, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            metrics::record_session(-(removed as i64));
        }
        removed
    }

    /// Number of stored sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are stored
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_resolve_revoke() {
        let sessions = SessionStore::new(Duration::from_secs(3600));
        let user = UserId::random();
        let token = sessions.issue(user);
        assert_eq!(sessions.resolve(&token).unwrap(), user);
        assert!(sessions.revoke(&token));
        assert!(!sessions.revoke(&token));
        assert!(matches!(sessions.resolve(&token), Err(Error::Unauthenticated)));
        assert!(matches!(sessions.resolve("made-up"), Err(Error::Unauthenticated)));
    }

    #[test]
    fn test_expired_sessions_are_refused() {
        let sessions = SessionStore::new(Duration::ZERO);
        let token = sessions.issue(UserId::random());
        assert!(matches!(sessions.resolve(&token), Err(Error::Unauthenticated)));
        assert!(sessions.is_empty());

        sessions.issue(UserId::random());
        assert_eq!(sessions.purge_expired(), 1);
    }

    #[test]
    fn test_abandoned_sessions_are_swept_by_later_logins() {
        let sessions = SessionStore::new(Duration::ZERO);
        for _ in 0..1000 {
            sessions.issue(UserId::random());
        }
        assert!(sessions.len() <= PURGE_EVERY, "held {} sessions", sessions.len());
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let sessions = SessionStore::new(Duration::from_secs(u64::MAX));
        let user = UserId::random();
        let token = sessions.issue(user);
        assert_eq!(sessions.resolve(&token).unwrap(), user);
    }
}
