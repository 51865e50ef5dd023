//! # API Module
//!
//! HTTP interface of the linkpage authority.
//!
//! ## Endpoints Overview
//!
//! ### Sessions
//! - `POST /auth/login` - Log in by username, returns a bearer token
//! - `GET|PUT /auth/me` - Current user
//! - `POST /auth/logout` - Revoke the current token
//!
//! ### Userpage
//! - `GET /userpage` - The caller's page (created on first access)
//! - `PUT /userpage/component/add` - Insert
//! - `PUT /userpage/component/update` - Update
//! - `DELETE /userpage/component/delete` - Delete
//! - `PUT /userpage/component/move` - Move
//!
//! ### Posts
//! - `PUT /user/posts/create` - Scrape a url into an unsaved post
//! - `PUT /user/posts/add` - Persist a post into the caller's collection
//! - `GET /user/posts` - The caller's collection
//! - `GET /home` - Public feed
//!
//! ### System Essentials
//! - `GET /health`, `GET /info`, `GET /metrics`

pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;

// Re-export commonly used items
pub use error::{status_for, ApiError, ErrorResponse};
pub use server::{create_router, serve_with_listener, spawn_session_sweeper, start_api_server};
