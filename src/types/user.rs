use serde::{Deserialize, Serialize};

use crate::types::error::{Error, Result};
use crate::types::ids::UserId;

/// Minimum username length
pub const USERNAME_MIN: usize = 3;
/// Maximum username length
pub const USERNAME_MAX: usize = 30;

/// Public user identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Display and login name
    pub username: String,
}

impl User {
    /// Create a user with a fresh id after validating the username
    pub fn new(username: &str) -> Result<Self> {
        Ok(Self {
            id: UserId::random(),
            username: normalize_username(username)?,
        })
    }
}

/// Trim and length-check a username
pub fn normalize_username(raw: &str) -> Result<String> {
    let username = raw.trim();
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(Error::invalid_input(format!(
            "username must be {}-{} characters",
            USERNAME_MIN, USERNAME_MAX
        )));
    }
    Ok(username.to_string())
}
