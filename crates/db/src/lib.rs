//! Persistence layer: models, repositories, migrations, and the store seam
//! consumed by the API crate.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod store;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Failure surfaced by a store implementation.
///
/// Unique-constraint violations are translated into [`StoreError::Conflict`]
/// at this boundary so callers never need to inspect driver error codes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

/// PostgreSQL `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unknown");
                tracing::debug!(constraint, "Unique constraint violated");
                let message = conflict_message(constraint);
                return StoreError::Conflict(message);
            }
        }
        StoreError::Database(err)
    }
}

/// Human-readable message for a violated unique constraint.
pub fn conflict_message(constraint: &str) -> String {
    match constraint {
        "uq_users_username" => "username already exists".to_string(),
        "uq_users_email" => "email already exists".to_string(),
        "uq_chat_members_chat_user" => "user is already a member of this chat".to_string(),
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_messages_name_the_field() {
        assert_eq!(conflict_message("uq_users_username"), "username already exists");
        assert_eq!(conflict_message("uq_users_email"), "email already exists");
        assert!(conflict_message("uq_other").contains("uq_other"));
    }

    #[test]
    fn test_non_database_errors_stay_database() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(sqlx::Error::RowNotFound)));
    }
}
