//! Request guard and the identity extractors it feeds.
//!
//! The guard runs as router middleware in front of every route. Public
//! routes pass straight through; everything else needs a bearer access token
//! that is absent from the revocation cache and cryptographically valid.
//! The authenticated identity is stored in the request extensions, where
//! [`AuthUser`] and [`MaybeAuthUser`] pick it up.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OriginalUri, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;
use parley_core::error::CoreError;
use parley_core::types::DbId;

use crate::auth::jwt::{validate_token, JwtConfig, TokenKind};
use crate::auth::revocation::RevocationCache;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Authenticated caller, decoded from a valid access token.
///
/// Use this as an extractor parameter in any guarded handler:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    pub username: String,
    /// The raw access token, kept so logout can revoke it.
    pub token: String,
}

/// Declarative table of routes that skip the guard.
///
/// Matching is exact on method and full request path.
#[derive(Debug, Clone, Default)]
pub struct PublicRoutes {
    routes: Vec<(Method, String)>,
}

impl PublicRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, method: Method, path: impl Into<String>) -> Self {
        self.routes.push((method, path.into()));
        self
    }

    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.routes.iter().any(|(m, p)| m == method && p == path)
    }
}

/// Everything the guard consults, passed explicitly.
pub struct GuardContext<'a> {
    pub public_routes: &'a PublicRoutes,
    pub revocations: &'a dyn RevocationCache,
    pub jwt: &'a JwtConfig,
}

/// Outcome of a successful guard check.
#[derive(Debug)]
pub enum Access {
    Public,
    Authenticated(AuthUser),
}

fn unauthenticated(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthenticated(msg.into()))
}

/// Extract the token from `Authorization: Bearer <token>`. The scheme is
/// case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Decide whether a request may proceed.
///
/// Order: public table, bearer extraction, revocation lookup, then signature
/// and expiry. A revoked token is rejected even if it would still verify.
pub async fn authorize(
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    ctx: &GuardContext<'_>,
) -> AppResult<Access> {
    if ctx.public_routes.contains(method, path) {
        return Ok(Access::Public);
    }

    let token = bearer_token(headers).ok_or_else(|| unauthenticated("Missing bearer token"))?;

    if ctx.revocations.is_revoked(token).await? {
        tracing::debug!(%path, "Rejected revoked access token");
        return Err(unauthenticated("Token has been revoked"));
    }

    let claims = validate_token(token, TokenKind::Access, ctx.jwt).map_err(|e| {
        tracing::debug!(error = %e, %path, "Rejected access token");
        unauthenticated("Invalid or expired token")
    })?;

    Ok(Access::Authenticated(AuthUser {
        user_id: claims.sub,
        username: claims.username,
        token: token.to_string(),
    }))
}

/// Router middleware wrapping [`authorize`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Nested routers see a stripped URI; the public table uses full paths.
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let ctx = GuardContext {
        public_routes: &state.public_routes,
        revocations: state.revocations.as_ref(),
        jwt: &state.config.jwt,
    };

    match authorize(request.method(), &path, request.headers(), &ctx).await? {
        Access::Public => {}
        Access::Authenticated(user) => {
            request.extensions_mut().insert(user);
        }
    }

    Ok(next.run(request).await)
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| unauthenticated("Authentication required"))
    }
}

/// Identity if the guard attached one. Never rejects.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}
