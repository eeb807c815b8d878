//! Handlers for the `/auth` resource (signup, login, logout, refresh).

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::extract::WithRejection;
use parley_core::error::CoreError;
use parley_db::models::user::UserProfile;
use serde::{Deserialize, Serialize};

use crate::auth::cookies::{
    clear_session_cookies, set_access_cookie, set_session_cookies, REFRESH_COOKIE,
};
use crate::auth::session::SignupInput;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::MaybeAuthUser;
use crate::response::{DataResponse, TokenPair};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup`. PascalCase keys are accepted too.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "Password")]
    pub password: String,
    #[serde(alias = "FullName")]
    pub full_name: String,
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(default, alias = "PhoneNumber")]
    pub phone_number: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default, alias = "BirthDate")]
    pub birth_date: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "Password")]
    pub password: String,
}

/// Fallback body for `POST /auth/refresh` when no cookie is present.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default, alias = "refreshToken", alias = "RefreshToken")]
    pub refresh_token: Option<String>,
}

/// Signup payload: the new user's public profile plus its first token pair.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/signup
///
/// Create an account. Tokens are returned in the body and set as cookies.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(input), _): WithRejection<Json<SignupRequest>, AppError>,
) -> AppResult<(CookieJar, Json<DataResponse<SignupResponse>>)> {
    let outcome = state
        .sessions
        .signup(SignupInput {
            username: input.username,
            password: input.password,
            full_name: input.full_name,
            email: input.email,
            phone_number: input.phone_number,
            birth_date: input.birth_date,
        })
        .await?;

    let jar = set_session_cookies(
        jar,
        &outcome.tokens.access_token,
        &outcome.tokens.refresh_token,
        &state.config.cookie,
    );

    Ok((
        jar,
        Json(DataResponse {
            data: SignupResponse {
                user: UserProfile::from(&outcome.user),
                access_token: outcome.tokens.access_token,
                refresh_token: outcome.tokens.refresh_token,
            },
        }),
    ))
}

/// POST /api/auth/login
///
/// Authenticate with username + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(input), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<(CookieJar, Json<DataResponse<TokenPair>>)> {
    if input.username.is_empty() || input.password.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "username and password are required".into(),
        )));
    }

    let tokens = state.sessions.login(&input.username, &input.password).await?;
    let jar = set_session_cookies(
        jar,
        &tokens.access_token,
        &tokens.refresh_token,
        &state.config.cookie,
    );

    Ok((jar, Json(DataResponse { data: tokens })))
}

/// POST /api/auth/logout
///
/// Revoke the presented access token and forget the stored refresh token.
/// `data` is `true` when a stored refresh token was cleared.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    MaybeAuthUser(identity): MaybeAuthUser,
) -> AppResult<(CookieJar, Json<DataResponse<bool>>)> {
    let Some(identity) = identity else {
        return Ok((jar, Json(DataResponse { data: false })));
    };

    let cleared = state.sessions.logout(Some(&identity)).await?;
    Ok((clear_session_cookies(jar), Json(DataResponse { data: cleared })))
}

/// POST /api/auth/refresh
///
/// Mint a new access token from the `refresh_token` cookie, or from a JSON
/// body `{ "refresh_token": ... }` when the cookie is absent.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, Json<DataResponse<TokenPair>>)> {
    let from_cookie = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    let presented = match from_cookie {
        Some(token) => Some(token),
        None if body.is_empty() => None,
        None => {
            let request: RefreshRequest = serde_json::from_slice(&body).map_err(|e| {
                AppError::Core(CoreError::Validation(format!("Invalid request body: {e}")))
            })?;
            request.refresh_token
        }
    };

    let tokens = state.sessions.refresh(presented.as_deref()).await?;
    let jar = set_access_cookie(jar, &tokens.access_token, &state.config.cookie);

    Ok((jar, Json(DataResponse { data: tokens })))
}
