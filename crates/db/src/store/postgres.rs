//! PostgreSQL-backed stores.

use async_trait::async_trait;
use parley_core::pagination::Page;
use parley_core::types::DbId;
use sqlx::{Postgres, Transaction};

use super::{ChatStore, UserStore, UserTx};
use crate::models::chat::{Chat, CreateChat};
use crate::models::user::{CreateUser, User};
use crate::repositories::{ChatRepo, UserRepo};
use crate::{DbPool, StoreError};

/// Store implementation delegating to the repositories over a shared pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// An open PostgreSQL transaction. Rolled back on drop unless committed.
pub struct PgUserTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UserStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn UserTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUserTx { tx }))
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_username(&self.pool, username).await?)
    }

    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError> {
        Ok(UserRepo::list(&self.pool, page).await?)
    }

    async fn set_refresh_token_hash(
        &self,
        id: DbId,
        hash: Option<&str>,
    ) -> Result<bool, StoreError> {
        Ok(UserRepo::set_refresh_token_hash(&self.pool, id, hash).await?)
    }

    async fn clear_refresh_token_hash(&self, username: &str) -> Result<bool, StoreError> {
        Ok(UserRepo::clear_refresh_token_hash(&self.pool, username).await?)
    }
}

#[async_trait]
impl UserTx for PgUserTx {
    async fn create_user(&mut self, input: &CreateUser) -> Result<User, StoreError> {
        Ok(UserRepo::create(&mut *self.tx, input).await?)
    }

    async fn set_refresh_token_hash(
        &mut self,
        id: DbId,
        hash: Option<&str>,
    ) -> Result<bool, StoreError> {
        Ok(UserRepo::set_refresh_token_hash(&mut *self.tx, id, hash).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn create(&self, input: &CreateChat) -> Result<Chat, StoreError> {
        let mut tx = self.pool.begin().await?;
        let chat = ChatRepo::create(&mut *tx, input).await?;
        ChatRepo::add_member(&mut *tx, chat.id, input.admin_id).await?;
        tx.commit().await?;
        Ok(chat)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Chat>, StoreError> {
        Ok(ChatRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list(&self, page: Page) -> Result<Vec<Chat>, StoreError> {
        Ok(ChatRepo::list(&self.pool, page).await?)
    }

    async fn search_by_title(&self, term: &str, page: Page) -> Result<Vec<Chat>, StoreError> {
        Ok(ChatRepo::search_by_title(&self.pool, term, page).await?)
    }

    async fn add_member(&self, chat_id: DbId, user_id: DbId) -> Result<bool, StoreError> {
        Ok(ChatRepo::add_member(&self.pool, chat_id, user_id).await?)
    }

    async fn remove_member(&self, chat_id: DbId, user_id: DbId) -> Result<bool, StoreError> {
        Ok(ChatRepo::remove_member(&self.pool, chat_id, user_id).await?)
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(ChatRepo::delete(&self.pool, id).await?)
    }
}
