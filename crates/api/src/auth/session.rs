//! Session lifecycle: signup, login, logout, and access-token refresh.
//!
//! [`SessionService`] orchestrates the credential store, the password
//! hasher, the token issuer, and the revocation cache. Handlers stay thin:
//! they translate HTTP input into calls on this service and the results into
//! responses and cookies.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use parley_core::error::CoreError;
use parley_core::types::DbId;
use parley_core::validation::{
    validate_birth_date, validate_email, validate_full_name, validate_password,
    validate_phone_number, validate_username,
};
use parley_db::models::user::{CreateUser, User};
use parley_db::store::UserStore;

use crate::auth::jwt::{generate_token, hash_refresh_token, validate_token, JwtConfig, TokenKind};
use crate::auth::password::{
    hash_password_blocking, verify_dummy_password_blocking, verify_password_blocking,
};
use crate::auth::revocation::RevocationCache;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::TokenPair;

/// Profile and credentials supplied at signup.
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    /// ISO `YYYY-MM-DD`.
    pub birth_date: Option<String>,
}

/// A freshly created user together with its first token pair.
#[derive(Debug)]
pub struct SignupOutcome {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserStore>,
    revocations: Arc<dyn RevocationCache>,
    jwt: JwtConfig,
    revocation_ttl: Duration,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "username or password is incorrect".into(),
    ))
}

fn invalid_refresh_token() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid token".into()))
}

impl SessionService {
    /// `revocation_ttl` is raised to the access-token lifetime if shorter,
    /// so a revoked token never outlives its revocation entry.
    pub fn new(
        users: Arc<dyn UserStore>,
        revocations: Arc<dyn RevocationCache>,
        jwt: JwtConfig,
        revocation_ttl: Duration,
    ) -> Self {
        let revocation_ttl = revocation_ttl.max(jwt.access_lifetime());
        Self {
            users,
            revocations,
            jwt,
            revocation_ttl,
        }
    }

    /// Create a user and issue its first token pair.
    ///
    /// The user row and its refresh-token hash are committed together; if
    /// token issuance or the hash update fails, no user is left behind.
    pub async fn signup(&self, input: SignupInput) -> AppResult<SignupOutcome> {
        let birth_date = validate_signup(&input)?;
        let password_hash = hash_password_blocking(input.password).await?;

        let mut tx = self.users.begin().await?;
        let user = tx
            .create_user(&CreateUser {
                username: input.username,
                email: input.email,
                password_hash,
                full_name: input.full_name,
                phone_number: input.phone_number,
                birth_date,
            })
            .await?;

        let tokens = self.issue_pair(user.id, &user.username)?;
        let refresh_hash = hash_refresh_token(&tokens.refresh_token);
        tx.set_refresh_token_hash(user.id, Some(&refresh_hash))
            .await?;
        tx.commit().await?;

        tracing::info!(user_id = user.id, username = %user.username, "User signed up");

        let mut user = user;
        user.refresh_token_hash = Some(refresh_hash);
        Ok(SignupOutcome { user, tokens })
    }

    /// Verify credentials and issue a fresh pair, replacing any stored
    /// refresh-token hash.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<TokenPair> {
        let Some(user) = self.users.find_by_username(username).await? else {
            verify_dummy_password_blocking(password.to_string()).await;
            tracing::warn!(username, "Login rejected: unknown user");
            return Err(invalid_credentials());
        };

        let verified =
            verify_password_blocking(password.to_string(), user.password_hash.clone()).await?;
        if !verified {
            tracing::warn!(user_id = user.id, "Login rejected: wrong password");
            return Err(invalid_credentials());
        }

        let tokens = self.issue_pair(user.id, &user.username)?;
        self.users
            .set_refresh_token_hash(user.id, Some(&hash_refresh_token(&tokens.refresh_token)))
            .await?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(tokens)
    }

    /// Clear the caller's stored refresh-token hash and revoke the access
    /// token they presented.
    ///
    /// Returns `false` without side effects when there is no identity, and
    /// `false` (after still revoking the token) when the user row is gone.
    pub async fn logout(&self, identity: Option<&AuthUser>) -> AppResult<bool> {
        let Some(identity) = identity else {
            return Ok(false);
        };

        let cleared = self
            .users
            .clear_refresh_token_hash(&identity.username)
            .await?;

        self.revocations
            .revoke(&identity.token, &identity.username, self.revocation_ttl)
            .await?;

        tracing::info!(
            user_id = identity.user_id,
            cleared,
            "Access token revoked on logout"
        );
        Ok(cleared)
    }

    /// Mint a new access token from a refresh token. The refresh token itself
    /// is returned unchanged.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> AppResult<TokenPair> {
        let refresh_token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(invalid_refresh_token)?;

        let claims = validate_token(refresh_token, TokenKind::Refresh, &self.jwt).map_err(|e| {
            tracing::debug!(error = %e, "Refresh token failed validation");
            invalid_refresh_token()
        })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(invalid_refresh_token)?;

        let presented_hash = hash_refresh_token(refresh_token);
        if user.refresh_token_hash.as_deref() != Some(presented_hash.as_str()) {
            tracing::warn!(user_id = user.id, "Refresh rejected: token does not match stored hash");
            return Err(invalid_refresh_token());
        }

        let access_token = self.issue(user.id, &user.username, TokenKind::Access)?;

        tracing::info!(user_id = user.id, "Access token refreshed");
        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }

    fn issue(&self, user_id: DbId, username: &str, kind: TokenKind) -> AppResult<String> {
        generate_token(user_id, username, kind, &self.jwt)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))
    }

    fn issue_pair(&self, user_id: DbId, username: &str) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(user_id, username, TokenKind::Access)?,
            refresh_token: self.issue(user_id, username, TokenKind::Refresh)?,
        })
    }
}

/// Check every signup field, returning the parsed birth date.
fn validate_signup(input: &SignupInput) -> Result<Option<NaiveDate>, CoreError> {
    validate_username(&input.username)?;
    validate_password(&input.password)?;
    validate_full_name(&input.full_name)?;
    validate_email(&input.email)?;
    if let Some(phone) = &input.phone_number {
        validate_phone_number(phone)?;
    }

    input
        .birth_date
        .as_deref()
        .map(|raw| {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                CoreError::Validation("birthDate must be a date in YYYY-MM-DD format".into())
            })?;
            validate_birth_date(date, Utc::now().date_naive())?;
            Ok(date)
        })
        .transpose()
}
