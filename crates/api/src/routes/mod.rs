pub mod auth;
pub mod chats;
pub mod health;
pub mod users;

use axum::http::Method;
use axum::Router;

use crate::middleware::auth::PublicRoutes;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/signup                  signup (public)
/// /auth/login                   login (public)
/// /auth/refresh                 refresh (public)
/// /auth/logout                  logout
///
/// /users                        paginated list
/// /users/me                     caller's profile
///
/// /chats                        create (POST), paginated list (GET)
/// /chats/find                   title search
/// /chats/join/{chat_id}         join (POST)
/// /chats/leave/{chat_id}        leave (DELETE)
/// /chats/{chat_id}              delete (DELETE, admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/chats", chats::router())
}

/// Routes reachable without a bearer token. Paths are full request paths.
pub fn public_routes() -> PublicRoutes {
    PublicRoutes::new()
        .allow(Method::GET, "/health")
        .allow(Method::POST, "/api/auth/signup")
        .allow(Method::POST, "/api/auth/login")
        .allow(Method::POST, "/api/auth/refresh")
}
