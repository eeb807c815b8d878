//! Repository for the `chats` and `chat_members` tables.

use parley_core::pagination::Page;
use parley_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::chat::{Chat, CreateChat};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, admin_id, created_at, updated_at";

/// Provides CRUD operations for chats and their memberships.
pub struct ChatRepo;

impl ChatRepo {
    /// Insert a new chat, returning the created row.
    pub async fn create<'e, E>(executor: E, input: &CreateChat) -> Result<Chat, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO chats (title, description, admin_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Chat>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.admin_id)
            .fetch_one(executor)
            .await
    }

    /// Find a chat by internal ID.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Chat>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM chats WHERE id = $1");
        sqlx::query_as::<_, Chat>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List chats, newest first.
    pub async fn list<'e, E>(executor: E, page: Page) -> Result<Vec<Chat>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM chats
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Chat>(&query)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(executor)
            .await
    }

    /// Case-insensitive substring search on the chat title, newest first.
    pub async fn search_by_title<'e, E>(
        executor: E,
        term: &str,
        page: Page,
    ) -> Result<Vec<Chat>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM chats
             WHERE title ILIKE '%' || $1 || '%' ESCAPE '\\'
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Chat>(&query)
            .bind(escape_like(term))
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(executor)
            .await
    }

    /// Delete a chat (memberships cascade). Returns `true` if a row was deleted.
    pub async fn delete<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add a member. Returns `false` if the user already belongs to the chat.
    pub async fn add_member<'e, E>(
        executor: E,
        chat_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "INSERT INTO chat_members (chat_id, user_id)
             VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_chat_members_chat_user DO NOTHING",
        )
        .bind(chat_id)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a member. Returns `false` if the user was not a member.
    pub async fn remove_member<'e, E>(
        executor: E,
        chat_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM chat_members WHERE chat_id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn test_escape_like_metacharacters() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
