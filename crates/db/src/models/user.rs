//! User entity model and DTOs.

use chrono::NaiveDate;
use parley_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password and refresh-token hashes -- NEVER serialize this to
/// API responses directly. Use [`UserProfile`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub refresh_token_hash: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no credential hashes).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserProfile {
    #[serde(rename = "UserId")]
    pub id: DbId,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(rename = "DateOfBirth")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "JoinDate")]
    pub created_at: Timestamp,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            birth_date: user.birth_date,
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user. `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
}
