//! In-process stores with the same observable semantics as PostgreSQL:
//! unique usernames/emails, unique memberships, all-or-nothing transactions.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parley_core::pagination::Page;
use parley_core::types::DbId;
use tokio::sync::RwLock;

use super::{ChatStore, UserStore, UserTx};
use crate::models::chat::{Chat, CreateChat};
use crate::models::user::{CreateUser, User};
use crate::{conflict_message, StoreError};

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    chats: Vec<Chat>,
    /// `(chat_id, user_id)` pairs.
    members: HashSet<(DbId, DbId)>,
}

impl MemoryState {
    fn unique_violation(&self, username: &str, email: &str) -> Option<&'static str> {
        if self.users.iter().any(|u| u.username == username) {
            return Some("uq_users_username");
        }
        if self.users.iter().any(|u| u.email == email) {
            return Some("uq_users_email");
        }
        None
    }

    fn user_mut(&mut self, id: DbId) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }
}

/// Cheaply cloneable handle; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    /// Sequence shared by users and chats. Like BIGSERIAL, values consumed by
    /// a rolled-back transaction are never reused.
    next_id: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> DbId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Writes staged until commit.
enum StagedWrite {
    CreateUser(User),
    SetRefreshHash(DbId, Option<String>),
}

pub struct MemoryUserTx {
    store: MemoryStore,
    staged: Vec<StagedWrite>,
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn UserTx>, StoreError> {
        Ok(Box::new(MemoryUserTx {
            store: self.clone(),
            staged: Vec::new(),
        }))
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;
        let mut users = state.users.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(users, page))
    }

    async fn set_refresh_token_hash(
        &self,
        id: DbId,
        hash: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(match state.user_mut(id) {
            Some(user) => {
                user.refresh_token_hash = hash.map(str::to_owned);
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn clear_refresh_token_hash(&self, username: &str) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(
            match state.users.iter_mut().find(|u| u.username == username) {
                Some(user) => {
                    user.refresh_token_hash = None;
                    user.updated_at = Utc::now();
                    true
                }
                None => false,
            },
        )
    }
}

impl MemoryUserTx {
    fn staged_user_mut(&mut self, id: DbId) -> Option<&mut User> {
        self.staged.iter_mut().find_map(|write| match write {
            StagedWrite::CreateUser(user) if user.id == id => Some(user),
            _ => None,
        })
    }

    fn staged_users(&self) -> impl Iterator<Item = &User> {
        self.staged.iter().filter_map(|write| match write {
            StagedWrite::CreateUser(user) => Some(user),
            StagedWrite::SetRefreshHash(..) => None,
        })
    }
}

#[async_trait]
impl UserTx for MemoryUserTx {
    async fn create_user(&mut self, input: &CreateUser) -> Result<User, StoreError> {
        {
            let state = self.store.state.read().await;
            if let Some(constraint) = state.unique_violation(&input.username, &input.email) {
                return Err(StoreError::Conflict(conflict_message(constraint)));
            }
        }
        if self.staged_users().any(|u| u.username == input.username) {
            return Err(StoreError::Conflict(conflict_message("uq_users_username")));
        }
        if self.staged_users().any(|u| u.email == input.email) {
            return Err(StoreError::Conflict(conflict_message("uq_users_email")));
        }

        let now = Utc::now();
        let user = User {
            id: self.store.allocate_id(),
            username: input.username.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            full_name: input.full_name.clone(),
            phone_number: input.phone_number.clone(),
            birth_date: input.birth_date,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };
        self.staged.push(StagedWrite::CreateUser(user.clone()));
        Ok(user)
    }

    async fn set_refresh_token_hash(
        &mut self,
        id: DbId,
        hash: Option<&str>,
    ) -> Result<bool, StoreError> {
        if let Some(user) = self.staged_user_mut(id) {
            user.refresh_token_hash = hash.map(str::to_owned);
            return Ok(true);
        }
        let exists = self
            .store
            .state
            .read()
            .await
            .users
            .iter()
            .any(|u| u.id == id);
        if exists {
            self.staged
                .push(StagedWrite::SetRefreshHash(id, hash.map(str::to_owned)));
        }
        Ok(exists)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryUserTx { store, staged } = *self;
        let mut state = store.state.write().await;

        // Another transaction may have committed the same username meanwhile.
        for write in &staged {
            if let StagedWrite::CreateUser(user) = write {
                if let Some(constraint) = state.unique_violation(&user.username, &user.email) {
                    return Err(StoreError::Conflict(conflict_message(constraint)));
                }
            }
        }

        for write in staged {
            match write {
                StagedWrite::CreateUser(user) => state.users.push(user),
                StagedWrite::SetRefreshHash(id, hash) => {
                    if let Some(user) = state.user_mut(id) {
                        user.refresh_token_hash = hash;
                        user.updated_at = Utc::now();
                    }
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn create(&self, input: &CreateChat) -> Result<Chat, StoreError> {
        let now = Utc::now();
        let chat = Chat {
            id: self.allocate_id(),
            title: input.title.clone(),
            description: input.description.clone(),
            admin_id: input.admin_id,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.chats.push(chat.clone());
        state.members.insert((chat.id, input.admin_id));
        Ok(chat)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Chat>, StoreError> {
        let state = self.state.read().await;
        Ok(state.chats.iter().find(|c| c.id == id).cloned())
    }

    async fn list(&self, page: Page) -> Result<Vec<Chat>, StoreError> {
        let state = self.state.read().await;
        Ok(paginate(newest_first(state.chats.clone()), page))
    }

    async fn search_by_title(&self, term: &str, page: Page) -> Result<Vec<Chat>, StoreError> {
        let needle = term.to_lowercase();
        let state = self.state.read().await;
        let matches: Vec<Chat> = state
            .chats
            .iter()
            .filter(|c| c.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(paginate(newest_first(matches), page))
    }

    async fn add_member(&self, chat_id: DbId, user_id: DbId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.members.insert((chat_id, user_id)))
    }

    async fn remove_member(&self, chat_id: DbId, user_id: DbId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.members.remove(&(chat_id, user_id)))
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.chats.len();
        state.chats.retain(|c| c.id != id);
        state.members.retain(|(chat_id, _)| *chat_id != id);
        Ok(state.chats.len() < before)
    }
}

fn newest_first(mut chats: Vec<Chat>) -> Vec<Chat> {
    chats.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    chats
}

fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit).unwrap_or(0))
        .collect()
}
