//! HTTP request handlers for the linkpage API
//!
//! Page mutations answer with the whole updated page; failures use the
//! [`ErrorResponse`](crate::api::error::ErrorResponse) body.

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::extract::{AuthUser, JsonRequest};
use crate::auth::LoginResponse;
use crate::core::AppState;
use crate::storage::StorageImpl;
use crate::system::metrics;
use crate::types::{Component, Error, PageOp, Post, User, Userpage};

/// Handler result
pub type ApiResult<T> = Result<T, ApiError>;

/// `POST /auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username, registered on first login
    pub username: String,
}

/// `PUT /userpage/component/add` and `/update`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRequest {
    /// Target index
    pub index: usize,
    /// Component to insert or replace with
    pub component: Component,
}

/// `DELETE /userpage/component/delete`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteComponentRequest {
    /// Index to remove
    pub index: usize,
}

/// `PUT /userpage/component/move`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveComponentRequest {
    /// Current index
    pub prev_index: usize,
    /// Index after the move
    pub new_index: usize,
}

/// `PUT /user/posts/create`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    /// Link to scrape
    pub url: String,
}

/// `PUT /user/posts/add`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPostRequest {
    /// Post to persist
    pub post: Post,
}

/// System health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Current system status
    pub status: String,
    /// Seconds since start
    pub uptime_secs: u64,
    /// Crate version
    pub version: String,
}

/// System information
#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    /// Service name
    pub name: String,
    /// Service version
    pub version: String,
    /// Storage backend
    pub storage: String,
    /// Registered users
    pub users: usize,
    /// Stored pages
    pub pages: usize,
    /// Stored posts
    pub posts: usize,
    /// Live sessions
    pub sessions: usize,
}

/// Root route: a short index of the API
pub async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": crate::NAME,
        "version": crate::VERSION,
        "routes": [
            "POST /auth/login", "GET|PUT /auth/me", "POST /auth/logout",
            "GET /userpage", "PUT /userpage/component/add", "PUT /userpage/component/update",
            "DELETE /userpage/component/delete", "PUT /userpage/component/move",
            "PUT /user/posts/create", "PUT /user/posts/add", "GET /user/posts",
            "GET /home", "GET /health", "GET /info", "GET /metrics"
        ]
    }))
}

/// Log in by username
pub async fn login<S: StorageImpl>(
    State(state): State<Arc<AppState<S>>>,
    JsonRequest(request): JsonRequest<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    Ok(Json(state.accounts.login(&request.username)?))
}

/// Current user
pub async fn current_user(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

/// End the caller's session
pub async fn logout<S: StorageImpl>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
) -> StatusCode {
    state.accounts.logout(&auth.token);
    StatusCode::NO_CONTENT
}

/// The caller's page, created on first access
pub async fn get_userpage<S: StorageImpl>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
) -> ApiResult<Json<Userpage>> {
    Ok(Json(state.pages.get_or_create(auth.user.id)?))
}

fn apply<S: StorageImpl>(state: &AppState<S>, auth: &AuthUser, op: PageOp) -> ApiResult<Json<Userpage>> {
    Ok(Json(state.pages.apply(auth.user.id, &op)?))
}

/// Insert a component
pub async fn add_component<S: StorageImpl>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    JsonRequest(request): JsonRequest<ComponentRequest>,
) -> ApiResult<Json<Userpage>> {
    apply(&state, &auth, PageOp::Insert { index: request.index, component: request.component })
}

/// Replace a component with one of the same variant
pub async fn update_component<S: StorageImpl>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    JsonRequest(request): JsonRequest<ComponentRequest>,
) -> ApiResult<Json<Userpage>> {
    apply(&state, &auth, PageOp::Update { index: request.index, component: request.component })
}

/// Remove a component
pub async fn delete_component<S: StorageImpl>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    JsonRequest(request): JsonRequest<DeleteComponentRequest>,
) -> ApiResult<Json<Userpage>> {
    apply(&state, &auth, PageOp::Delete { index: request.index })
}

/// Move a component
pub async fn move_component<S: StorageImpl>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    JsonRequest(request): JsonRequest<MoveComponentRequest>,
) -> ApiResult<Json<Userpage>> {
    apply(
        &state,
        &auth,
        PageOp::Move { prev_index: request.prev_index, new_index: request.new_index },
    )
}

/// Scrape a url into an unsaved post
pub async fn create_post<S: StorageImpl>(
    State(state): State<Arc<AppState<S>>>,
    _auth: AuthUser,
    JsonRequest(request): JsonRequest<CreatePostRequest>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.posts.create_post(&request.url).await?))
}

/// Persist a post into the caller's collection
pub async fn add_post<S: StorageImpl>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    JsonRequest(request): JsonRequest<AddPostRequest>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.posts.add_post(auth.user.id, request.post)?))
}

/// The caller's post collection
pub async fn user_posts<S: StorageImpl>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
) -> Json<Vec<Post>> {
    Json(state.posts.user_posts(auth.user.id))
}

/// Public feed
pub async fn feed<S: StorageImpl>(State(state): State<Arc<AppState<S>>>) -> Json<Vec<Post>> {
    Json(state.posts.feed())
}

/// Health check endpoint
pub async fn health_check<S: StorageImpl>(State(state): State<Arc<AppState<S>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        version: crate::VERSION.to_string(),
    })
}

/// System information endpoint
pub async fn system_info<S: StorageImpl>(State(state): State<Arc<AppState<S>>>) -> Json<InfoResponse> {
    let backend = state.store.backend();
    Json(InfoResponse {
        name: crate::NAME.to_string(),
        version: crate::VERSION.to_string(),
        storage: format!("{:?}", state.config.storage.storage_type).to_lowercase(),
        users: backend.user_count(),
        pages: backend.page_count(),
        posts: backend.post_count(),
        sessions: state.accounts.sessions().len(),
    })
}

/// Prometheus exposition
pub async fn metrics_handler<S: StorageImpl>(State(state): State<Arc<AppState<S>>>) -> ApiResult<Response> {
    if !state.config.metrics.enable_prometheus {
        return Err(ApiError(Error::not_found("metrics are disabled")));
    }
    let body = metrics::collect_metrics()?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}
