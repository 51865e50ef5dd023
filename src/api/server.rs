//! HTTP server implementation for the linkpage API

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
        Method,
    },
    routing::{delete, get, post, put},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers;
use crate::core::{AppState, ConfiguredAppState};
use crate::storage::StorageImpl;

/// How often expired sessions are swept while serving
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Creates the main application router with all routes and middleware
pub fn create_router<S: StorageImpl>(app_state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION, COOKIE])
        .allow_origin(Any);
    let timeout = app_state.config.server.request_timeout;

    Router::new()
        .route("/", get(handlers::root_handler))

        // Session routes
        .route("/auth/login", post(handlers::login::<S>))
        .route("/auth/me", get(handlers::current_user).put(handlers::current_user))
        .route("/auth/logout", post(handlers::logout::<S>))

        // Page routes
        .route("/userpage", get(handlers::get_userpage::<S>))
        .route("/userpage/component/add", put(handlers::add_component::<S>))
        .route("/userpage/component/update", put(handlers::update_component::<S>))
        .route("/userpage/component/delete", delete(handlers::delete_component::<S>))
        .route("/userpage/component/move", put(handlers::move_component::<S>))

        // Post routes
        .route("/user/posts/create", put(handlers::create_post::<S>))
        .route("/user/posts/add", put(handlers::add_post::<S>))
        .route("/user/posts", get(handlers::user_posts::<S>))
        .route("/home", get(handlers::feed::<S>))

        // System routes
        .route("/health", get(handlers::health_check::<S>))
        .route("/info", get(handlers::system_info::<S>))
        .route("/metrics", get(handlers::metrics_handler::<S>))

        // Apply middleware to ALL routes
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(cors),
        )
        .with_state(app_state)
}

/// Serve `app` on an already bound listener until `shutdown` resolves
pub async fn serve_with_listener(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn serve_state<S: StorageImpl>(
    addr: SocketAddr,
    app_state: Arc<AppState<S>>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    let sweeper = spawn_session_sweeper(app_state.clone(), SESSION_SWEEP_INTERVAL);
    let result = serve_with_listener(listener, create_router(app_state), shutdown).await;
    sweeper.abort();
    result
}

/// Periodically drop expired sessions so abandoned tokens do not accumulate
pub fn spawn_session_sweeper<S: StorageImpl>(app_state: Arc<AppState<S>>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let removed = app_state.accounts.sessions().purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "expired sessions swept");
            }
        }
    })
}

/// Start the HTTP server with the configured AppState
pub async fn start_api_server(
    configured_app_state: ConfiguredAppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let http_addr = configured_app_state.http_addr();
    tracing::info!(
        "Starting linkpage API server on {} with {} storage",
        http_addr,
        configured_app_state.storage_name()
    );

    // Match once on storage type to get concrete AppState, then start server
    match configured_app_state {
        ConfiguredAppState::Memory { app_state } => serve_state(http_addr, app_state, shutdown).await,
        ConfiguredAppState::File { app_state } => serve_state(http_addr, app_state, shutdown).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{create_app_state_with_scraper, Config};
    use crate::scrape::{LinkMetadata, StaticScraper};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let scraper = StaticScraper::new().with_page(
            "https://www.rust-lang.org",
            LinkMetadata {
                title: "Rust".into(),
                description: "Reliable and efficient software".into(),
                ..Default::default()
            },
        );
        match create_app_state_with_scraper(Config::default(), Arc::new(scraper)).unwrap() {
            ConfiguredAppState::Memory { app_state } => create_router(app_state),
            ConfiguredAppState::File { .. } => unreachable!("default config uses memory storage"),
        }
    }

    async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    async fn login(app: &Router, username: &str) -> String {
        let (status, body) = call(app, Method::POST, "/auth/login", None, Some(json!({"username": username}))).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_requires_session() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/userpage", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "unauthenticated");
        assert_eq!(body["success"], false);

        let (status, _) = call(&app, Method::GET, "/auth/me", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, Method::GET, "/home", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_page_edit_round_trip() {
        let app = app();
        let token = login(&app, "ada").await;

        let (status, page) = call(&app, Method::GET, "/userpage", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["components"], json!([{"header": {"content": "My Page", "size": 1}}]));

        let (status, page) = call(
            &app,
            Method::PUT,
            "/userpage/component/add",
            Some(&token),
            Some(json!({"index": 1, "component": {"paragraph": {"content": "hello"}}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["components"].as_array().unwrap().len(), 2);

        let (status, page) = call(
            &app,
            Method::PUT,
            "/userpage/component/move",
            Some(&token),
            Some(json!({"prev_index": 0, "new_index": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["components"][0], json!({"paragraph": {"content": "hello"}}));

        let (status, body) = call(
            &app,
            Method::PUT,
            "/userpage/component/update",
            Some(&token),
            Some(json!({"index": 0, "component": {"divider": {"style": "regular"}}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");

        let (status, body) = call(
            &app,
            Method::DELETE,
            "/userpage/component/delete",
            Some(&token),
            Some(json!({"index": 9})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");

        let (status, _) = call(
            &app,
            Method::PUT,
            "/userpage/component/add",
            Some(&token),
            Some(json!({"index": 0, "component": {"header": {"content": "x", "size": 9}}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, page) = call(&app, Method::GET, "/userpage", Some(&token), None).await;
        assert_eq!(page["components"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_post_flow() {
        let app = app();
        let token = login(&app, "grace").await;

        let (status, body) = call(
            &app,
            Method::PUT,
            "/user/posts/create",
            Some(&token),
            Some(json!({"url": "https://example.com/nothing"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "unsupported");

        let (status, draft) = call(
            &app,
            Method::PUT,
            "/user/posts/create",
            Some(&token),
            Some(json!({"url": "https://www.rust-lang.org"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(draft.get("id").is_none());

        let (status, stored) = call(&app, Method::PUT, "/user/posts/add", Some(&token), Some(json!({"post": draft}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(stored["id"].is_string());

        let (_, mine) = call(&app, Method::GET, "/user/posts", Some(&token), None).await;
        assert_eq!(mine, json!([stored.clone()]));
        let (_, feed) = call(&app, Method::GET, "/home", None, None).await;
        assert_eq!(feed, json!([stored]));
    }

    #[tokio::test]
    async fn test_sweeper_drops_expired_sessions() {
        let mut config = Config::default();
        config.auth.session_ttl = Duration::ZERO;
        let app_state = match create_app_state_with_scraper(config, Arc::new(StaticScraper::new())).unwrap() {
            ConfiguredAppState::Memory { app_state } => app_state,
            ConfiguredAppState::File { .. } => unreachable!("default config uses memory storage"),
        };
        for name in ["ada", "grace", "linus"] {
            app_state.accounts.login(name).unwrap();
        }
        assert_eq!(app_state.accounts.sessions().len(), 3);

        let sweeper = spawn_session_sweeper(app_state.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweeper.abort();
        assert!(app_state.accounts.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let app = app();
        let token = login(&app, "linus").await;
        let (status, me) = call(&app, Method::PUT, "/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["username"], "linus");

        let (status, _) = call(&app, Method::POST, "/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, "/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
