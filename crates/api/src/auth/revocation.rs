//! Access-token revocation cache.
//!
//! Logout inserts the raw access token with a TTL covering its remaining
//! validity; the request guard rejects any token found here. Entries are
//! never deleted explicitly, they simply expire.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::RwLock;

const KEY_PREFIX: &str = "revoked:";

/// Longest lifetime any entry is stored with.
pub const MAX_ENTRY_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Failure talking to the revocation backend.
#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    #[error("Revocation cache error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Storage for revoked access tokens.
#[async_trait]
pub trait RevocationCache: Send + Sync {
    /// Mark `token` as revoked by `username` for `ttl`.
    async fn revoke(&self, token: &str, username: &str, ttl: Duration)
        -> Result<(), RevocationError>;

    /// Whether `token` has been revoked and the entry has not yet expired.
    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError>;
}

fn cache_key(token: &str) -> String {
    format!("{KEY_PREFIX}{token}")
}

/// Redis-backed cache. Keys are `revoked:<token>`, values the username.
#[derive(Clone)]
pub struct RedisRevocationCache {
    conn: ConnectionManager,
}

impl RedisRevocationCache {
    /// Open a managed (auto-reconnecting) connection to `url`.
    pub async fn connect(url: &str) -> Result<Self, RevocationError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl RevocationCache for RedisRevocationCache {
    async fn revoke(
        &self,
        token: &str,
        username: &str,
        ttl: Duration,
    ) -> Result<(), RevocationError> {
        let mut conn = self.conn.clone();
        // SET EX rejects zero.
        let secs = ttl.min(MAX_ENTRY_TTL).as_secs().max(1);
        conn.set_ex::<_, _, ()>(cache_key(token), username, secs)
            .await?;
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(cache_key(token)).await?;
        Ok(exists)
    }
}

/// Process-local cache used when no Redis URL is configured, and in tests.
///
/// Revocations do not survive a restart and are not shared between
/// processes.
#[derive(Default)]
pub struct MemoryRevocationCache {
    /// Key -> expiry instant.
    entries: RwLock<HashMap<String, Instant>>,
}

impl MemoryRevocationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationCache for MemoryRevocationCache {
    async fn revoke(
        &self,
        token: &str,
        _username: &str,
        ttl: Duration,
    ) -> Result<(), RevocationError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, expires_at| *expires_at > now);
        entries.insert(cache_key(token), now + ttl.min(MAX_ENTRY_TTL));
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&cache_key(token))
            .is_some_and(|expires_at| *expires_at > Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_revoked_token_is_reported() {
        let cache = MemoryRevocationCache::new();
        assert!(!cache.is_revoked("tok").await.unwrap());

        cache
            .revoke("tok", "alice1", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(cache.is_revoked("tok").await.unwrap());
        assert!(!cache.is_revoked("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryRevocationCache::new();
        cache
            .revoke("short", "alice1", Duration::from_millis(20))
            .await
            .unwrap();
        assert!(cache.is_revoked("short").await.unwrap());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!cache.is_revoked("short").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_entries_are_pruned_on_write() {
        let cache = MemoryRevocationCache::new();
        cache
            .revoke("old", "a", Duration::from_millis(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache
            .revoke("new", "b", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.entries.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_ttl_is_capped() {
        let cache = MemoryRevocationCache::new();
        cache.revoke("forever", "alice1", Duration::MAX).await.unwrap();
        assert!(cache.is_revoked("forever").await.unwrap());
    }

    #[test]
    fn test_cache_key_prefix() {
        assert_eq!(cache_key("abc"), "revoked:abc");
    }
}
