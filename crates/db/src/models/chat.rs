//! Chat entity model and DTOs.

use parley_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A chat row from the `chats` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Chat {
    #[serde(rename = "ChatId")]
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub admin_id: DbId,
    pub created_at: Timestamp,
    #[serde(skip)]
    pub updated_at: Timestamp,
}

/// DTO for creating a new chat. The admin becomes its first member.
#[derive(Debug, Clone)]
pub struct CreateChat {
    pub title: String,
    pub description: Option<String>,
    pub admin_id: DbId,
}
