//! HTTP implementation of [`RemoteService`]

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

use crate::api::ErrorResponse;
use crate::auth::LoginResponse;
use crate::client::remote::RemoteService;
use crate::types::{Component, Error, Post, Result, User, Userpage};

/// Talks to a linkpage server over HTTP with a bearer token
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl HttpRemote {
    /// Client for the server at `base_url`.
    ///
    /// A path in `base_url` is kept as a prefix for every request, with or
    /// without a trailing slash.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::config(format!("Invalid server url {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!("Server url {} cannot take request paths", base_url)));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Use an existing session token
    pub fn with_token(self, token: impl Into<String>) -> Self {
        *self.token.write() = Some(token.into());
        self
    }

    /// Current session token
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Log in and keep the issued token
    pub async fn login(&self, username: &str) -> Result<User> {
        let response: LoginResponse = self
            .send(Method::POST, "auth/login", Some(&json!({ "username": username })))
            .await?;
        *self.token.write() = Some(response.token);
        Ok(response.user)
    }

    /// Revoke the session and forget the token
    pub async fn logout(&self) -> Result<()> {
        if self.token().is_none() {
            return Ok(());
        }
        let result = self.send_raw(Method::POST, "auth/logout", None::<&()>).await;
        *self.token.write() = None;
        result.map(|_| ())
    }

    /// Startup session check: any failure means "not logged in"
    pub async fn restore_session(&self) -> Option<User> {
        match self.current_user().await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "no usable session");
                None
            }
        }
    }

    /// `path` is relative ("userpage", not "userpage") so the base path survives the join
    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::config(format!("Invalid request path {:?}: {}", path, e)))
    }

    async fn send_raw<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let url = self.url(path)?;
        let mut request = self.client.request(method.clone(), url);
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "request failed");
            Error::unavailable(format!("{} {}: {}", method, path, e))
        })?;

        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response).await)
    }

    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let response = self.send_raw(method, path, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::unavailable(format!("unreadable response from {}: {}", path, e)))
    }
}

async fn error_from_response(response: reqwest::Response) -> Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(body) => Error::from_kind(body.kind, body.error),
        Err(_) => error_from_status(status, text),
    }
}

/// Classify a non-JSON error response by status code
pub fn error_from_status(status: StatusCode, text: String) -> Error {
    let message = if text.is_empty() { status.to_string() } else { text };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthenticated,
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::BAD_REQUEST => Error::InvalidInput(message),
        StatusCode::UNPROCESSABLE_ENTITY => Error::Unsupported(message),
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT
        | StatusCode::REQUEST_TIMEOUT => Error::Unavailable(message),
        _ => Error::Internal(message),
    }
}

#[async_trait]
impl RemoteService for HttpRemote {
    async fn current_user(&self) -> Result<User> {
        self.send(Method::GET, "auth/me", None::<&()>).await
    }

    async fn get_userpage(&self) -> Result<Userpage> {
        self.send(Method::GET, "userpage", None::<&()>).await
    }

    async fn add_component(&self, index: usize, component: &Component) -> Result<Userpage> {
        let body = json!({ "index": index, "component": component });
        self.send(Method::PUT, "userpage/component/add", Some(&body)).await
    }

    async fn update_component(&self, index: usize, component: &Component) -> Result<Userpage> {
        let body = json!({ "index": index, "component": component });
        self.send(Method::PUT, "userpage/component/update", Some(&body)).await
    }

    async fn delete_component(&self, index: usize) -> Result<Userpage> {
        let body = json!({ "index": index });
        self.send(Method::DELETE, "userpage/component/delete", Some(&body)).await
    }

    async fn move_component(&self, prev_index: usize, new_index: usize) -> Result<Userpage> {
        let body = json!({ "prev_index": prev_index, "new_index": new_index });
        self.send(Method::PUT, "userpage/component/move", Some(&body)).await
    }

    async fn create_post(&self, url: &str) -> Result<Post> {
        self.send(Method::PUT, "user/posts/create", Some(&json!({ "url": url }))).await
    }

    async fn add_post(&self, post: &Post) -> Result<Post> {
        self.send(Method::PUT, "user/posts/add", Some(&json!({ "post": post }))).await
    }

    async fn user_posts(&self) -> Result<Vec<Post>> {
        self.send(Method::GET, "user/posts", None::<&()>).await
    }

    async fn feed(&self) -> Result<Vec<Post>> {
        self.send(Method::GET, "home", None::<&()>).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{create_router, serve_with_listener};
    use crate::core::{create_app_state_with_scraper, Config, ConfiguredAppState};
    use crate::scrape::DisabledScraper;
    use crate::types::HeaderSize;
    use std::sync::Arc;

    fn app() -> axum::Router {
        match create_app_state_with_scraper(Config::default(), Arc::new(DisabledScraper)).unwrap() {
            ConfiguredAppState::Memory { app_state } => create_router(app_state),
            ConfiguredAppState::File { .. } => unreachable!("default config uses memory storage"),
        }
    }

    async fn spawn_server() -> String {
        spawn(app()).await
    }

    async fn spawn(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = serve_with_listener(listener, app, std::future::pending()).await;
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_status_fallback() {
        assert!(matches!(error_from_status(StatusCode::UNAUTHORIZED, String::new()), Error::Unauthenticated));
        assert!(matches!(error_from_status(StatusCode::UNPROCESSABLE_ENTITY, "x".into()), Error::Unsupported(_)));
        assert!(matches!(error_from_status(StatusCode::BAD_GATEWAY, String::new()), Error::Unavailable(_)));
        assert!(matches!(error_from_status(StatusCode::IM_A_TEAPOT, String::new()), Error::Internal(_)));
    }

    #[tokio::test]
    async fn test_round_trip_over_http() {
        let base = spawn_server().await;
        let remote = HttpRemote::new(&base, Duration::from_secs(5)).unwrap();

        assert!(remote.restore_session().await.is_none());
        assert!(matches!(remote.get_userpage().await, Err(Error::Unauthenticated)));

        let user = remote.login("hopper").await.unwrap();
        assert_eq!(remote.restore_session().await, Some(user));

        let page = remote.get_userpage().await.unwrap();
        assert_eq!(page.components, vec![Component::header("My Page", HeaderSize::LARGE)]);

        let page = remote.add_component(0, &Component::divider()).await.unwrap();
        assert_eq!(page.components[0], Component::divider());

        let err = remote.delete_component(5).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = remote.create_post("https://example.com").await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));

        remote.logout().await.unwrap();
        assert!(remote.token().is_none());
        assert!(matches!(remote.user_posts().await, Err(Error::Unauthenticated)));
    }

    #[test]
    fn test_base_path_is_kept() {
        let remote = HttpRemote::new("http://linkpage.test/api", Duration::from_secs(1)).unwrap();
        assert_eq!(remote.url("auth/login").unwrap().as_str(), "http://linkpage.test/api/auth/login");

        let remote = HttpRemote::new("http://linkpage.test/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(remote.url("userpage").unwrap().as_str(), "http://linkpage.test/api/userpage");

        let remote = HttpRemote::new("http://linkpage.test", Duration::from_secs(1)).unwrap();
        assert_eq!(remote.url("home").unwrap().as_str(), "http://linkpage.test/home");

        assert!(matches!(HttpRemote::new("mailto:someone@example.com", Duration::from_secs(1)), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_server_mounted_under_prefix() {
        let base = spawn(axum::Router::new().nest("/api", app())).await;
        let remote = HttpRemote::new(&format!("{}/api", base), Duration::from_secs(5)).unwrap();

        remote.login("lovelace").await.unwrap();
        let page = remote.get_userpage().await.unwrap();
        assert_eq!(page.components.len(), 1);
        assert!(remote.feed().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let remote = HttpRemote::new(&format!("http://{}", addr), Duration::from_secs(2))
            .unwrap()
            .with_token("stale");
        assert!(matches!(remote.get_userpage().await, Err(Error::Unavailable(_))));
    }
}
