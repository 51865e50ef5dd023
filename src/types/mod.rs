//! Type definitions shared by the server and the client core

/// Error handling
pub mod error;
/// Fixed-size identifiers
pub mod ids;
/// Page components
pub mod component;
/// Userpage documents and edit operations
pub mod page;
/// Link-preview posts
pub mod post;
/// Users
pub mod user;

pub use error::{Error, ErrorKind, Result};
pub use ids::{PageId, PostId, UserId, ID16};
pub use component::{Component, ComponentKind, DividerStyle, HeaderSize, PostSize};
pub use page::{PageOp, Userpage};
pub use post::{Post, PostField};
pub use user::User;
