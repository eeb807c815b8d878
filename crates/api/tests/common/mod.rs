//! Shared helpers for HTTP integration tests.
//!
//! Tests drive the real router (guard and middleware stack included) over the
//! in-process store and revocation cache, so no PostgreSQL or Redis is needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use parley_api::auth::cookies::CookieConfig;
use parley_api::auth::jwt::JwtConfig;
use parley_api::auth::revocation::MemoryRevocationCache;
use parley_api::config::{LogFormat, ServerConfig};
use parley_api::router::build_app_router;
use parley_api::state::AppState;
use parley_db::store::MemoryStore;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            access_secret: "integration-access-secret".to_string(),
            access_token_expiry_mins: 15,
            refresh_secret: "integration-refresh-secret".to_string(),
            refresh_token_expiry_days: 7,
        },
        redis_url: None,
        revocation_ttl_secs: 15 * 60,
        cookie: CookieConfig {
            max_age_days: 7,
            secure: false,
        },
        log_format: LogFormat::Text,
    }
}

/// Everything a test may want to inspect behind the router.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub revocations: Arc<MemoryRevocationCache>,
    pub config: ServerConfig,
}

impl TestApp {
    /// A fresh clone of the router, ready for `oneshot`.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router over fresh in-process collaborators.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = MemoryStore::new();
    let revocations = Arc::new(MemoryRevocationCache::new());

    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        revocations.clone(),
        config.clone(),
    );
    let router = build_app_router(state, &config);

    TestApp {
        router,
        store,
        revocations,
        config,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, empty_request(Method::GET, uri, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, empty_request(Method::GET, uri, Some(token))).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::POST, uri, None, body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::POST, uri, Some(token), body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, empty_request(Method::POST, uri, Some(token))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, empty_request(Method::DELETE, uri, Some(token))).await
}

/// POST with only a `Cookie` header (no body, no bearer token).
pub async fn post_with_cookie(app: Router, uri: &str, cookie: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `Set-Cookie` header values on a response.
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// The `Set-Cookie` value for `name`, panicking if absent.
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

// ---------------------------------------------------------------------------
// Flow helpers
// ---------------------------------------------------------------------------

/// Sign up `username` with a valid profile and return the response `data`.
pub async fn signup(app: Router, username: &str) -> serde_json::Value {
    let body = serde_json::json!({
        "username": username,
        "password": "Pass1234",
        "fullName": "Test User",
        "email": format!("{username}@test.com"),
    });
    let response = post_json(app, "/api/auth/signup", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await["data"].clone()
}

/// Sign up `username` and return its access token.
pub async fn signup_token(app: Router, username: &str) -> String {
    signup(app, username).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Whether `token` looks like a compact JWS (three dot-separated segments).
pub fn is_jwt_shaped(token: &str) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty())
}
