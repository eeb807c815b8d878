//! JWT generation/validation for access and refresh tokens.
//!
//! Both token classes are HS256-signed JWTs carrying the same [`Claims`]
//! shape but signed with distinct secrets and lifetimes, selected by
//! [`TokenKind`]. Only a SHA-256 hash of the refresh token is persisted so a
//! database leak does not expose usable refresh tokens.

use std::time::Duration;

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use parley_core::types::DbId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::{bounded, parse_or, required, ConfigError};

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    pub username: String,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Unique token identifier (UUID v4). Two tokens minted in the same
    /// second for the same user still differ.
    pub jti: String,
}

/// Token class; selects the signing secret and lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret for access tokens.
    pub access_secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// HMAC-SHA256 secret for refresh tokens. Never equal to `access_secret`.
    pub refresh_secret: String,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_token_expiry_days: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;
/// Upper bound on the access token lifetime (one day).
pub const MAX_ACCESS_EXPIRY_MINS: i64 = 24 * 60;
/// Upper bound on the refresh token lifetime.
pub const MAX_REFRESH_EXPIRY_DAYS: i64 = 365;

impl JwtConfig {
    /// Load JWT configuration through a variable lookup.
    ///
    /// | Env Var                     | Required | Default |
    /// |-----------------------------|----------|---------|
    /// | `ACCESS_TOKEN_SECRET`       | **yes**  | --      |
    /// | `ACCESS_TOKEN_EXPIRY_MINS`  | no       | `15`    |
    /// | `REFRESH_TOKEN_SECRET`      | **yes**  | --      |
    /// | `REFRESH_TOKEN_EXPIRY_DAYS` | no       | `7`     |
    ///
    /// Lifetimes must lie in `1..=MAX_ACCESS_EXPIRY_MINS` and
    /// `1..=MAX_REFRESH_EXPIRY_DAYS`.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_secret = required(lookup, "ACCESS_TOKEN_SECRET")?;
        let refresh_secret = required(lookup, "REFRESH_TOKEN_SECRET")?;
        if access_secret == refresh_secret {
            return Err(ConfigError::Invalid {
                name: "REFRESH_TOKEN_SECRET",
                reason: "must differ from ACCESS_TOKEN_SECRET".into(),
            });
        }

        let access_token_expiry_mins = bounded(
            "ACCESS_TOKEN_EXPIRY_MINS",
            parse_or(lookup, "ACCESS_TOKEN_EXPIRY_MINS", DEFAULT_ACCESS_EXPIRY_MINS)?,
            1,
            MAX_ACCESS_EXPIRY_MINS,
        )?;

        let refresh_token_expiry_days = bounded(
            "REFRESH_TOKEN_EXPIRY_DAYS",
            parse_or(lookup, "REFRESH_TOKEN_EXPIRY_DAYS", DEFAULT_REFRESH_EXPIRY_DAYS)?,
            1,
            MAX_REFRESH_EXPIRY_DAYS,
        )?;

        Ok(Self {
            access_secret,
            access_token_expiry_mins,
            refresh_secret,
            refresh_token_expiry_days,
        })
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    fn lifetime_secs(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_token_expiry_mins.saturating_mul(60),
            TokenKind::Refresh => self.refresh_token_expiry_days.saturating_mul(24 * 60 * 60),
        }
    }

    /// Validity window of an access token.
    pub fn access_lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs(TokenKind::Access).unsigned_abs())
    }
}

/// Generate an HS256 token of the given class for a user.
pub fn generate_token(
    user_id: DbId,
    username: &str,
    kind: TokenKind,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();

    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        iat: now,
        exp: now.saturating_add(config.lifetime_secs(kind)),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret(kind)),
    )
}

/// Validate and decode a token of the given class, returning its [`Claims`].
///
/// Checks the signature against the class secret and the expiration. No
/// leeway is granted past `exp`: a revocation entry only has to outlive the
/// token's own lifetime.
pub fn validate_token(
    token: &str,
    kind: TokenKind,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default(); // HS256, validates exp
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret(kind)),
        &validation,
    )?;
    Ok(token_data.claims)
}

/// Compute the SHA-256 hex digest of a refresh token.
///
/// Use this to compare an incoming refresh token against the stored hash.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
