//! Store traits consumed by the API layer.
//!
//! - [`postgres::PgStore`] -- production implementation over the repositories.
//! - [`memory::MemoryStore`] -- in-process implementation for tests and local
//!   experiments; honours the same uniqueness and transaction semantics.

use async_trait::async_trait;
use parley_core::pagination::Page;
use parley_core::types::DbId;

use crate::models::chat::{Chat, CreateChat};
use crate::models::user::{CreateUser, User};
use crate::StoreError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Credential store: user rows and their refresh-token hashes.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Confirm the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Open a unit of work. Dropping it without [`UserTx::commit`] discards
    /// every change made through it.
    async fn begin(&self) -> Result<Box<dyn UserTx>, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError>;

    /// Overwrite or clear the refresh-token hash; last write wins.
    async fn set_refresh_token_hash(
        &self,
        id: DbId,
        hash: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Clear the refresh-token hash by username. Returns `false` if no user matched.
    async fn clear_refresh_token_hash(&self, username: &str) -> Result<bool, StoreError>;
}

/// Transactional writes against the credential store.
#[async_trait]
pub trait UserTx: Send {
    /// Insert a user. Fails with [`StoreError::Conflict`] on a duplicate
    /// username or email.
    async fn create_user(&mut self, input: &CreateUser) -> Result<User, StoreError>;

    async fn set_refresh_token_hash(
        &mut self,
        id: DbId,
        hash: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Make every change visible atomically.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Chats and chat memberships.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Create a chat and enrol its admin as the first member, atomically.
    async fn create(&self, input: &CreateChat) -> Result<Chat, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<Chat>, StoreError>;

    async fn list(&self, page: Page) -> Result<Vec<Chat>, StoreError>;

    async fn search_by_title(&self, term: &str, page: Page) -> Result<Vec<Chat>, StoreError>;

    /// Returns `false` if the user already belongs to the chat.
    async fn add_member(&self, chat_id: DbId, user_id: DbId) -> Result<bool, StoreError>;

    /// Returns `false` if the user was not a member.
    async fn remove_member(&self, chat_id: DbId, user_id: DbId) -> Result<bool, StoreError>;

    /// Returns `false` if the chat did not exist.
    async fn delete(&self, id: DbId) -> Result<bool, StoreError>;
}
