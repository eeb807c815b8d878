use crate::types::DbId;

/// Domain-level failure categories.
///
/// `Unauthorized` covers bad credentials and unverifiable tokens presented
/// to the session endpoints; `Unauthenticated` is reserved for the request
/// guard (missing, invalid, or revoked bearer token).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
