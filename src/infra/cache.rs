//! Redis cache implementation.
//!
//! `CacheStore` is the raw key/value seam (Redis in production, an
//! in-memory map in tests). `Cache` layers typed JSON helpers, the user
//! read-through keys and the fixed-window rate limiter on top of it.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::config::{
    Config, CACHE_KEY_HEALTH, CACHE_KEY_USER_LIST, CACHE_PREFIX_RATE_LIMIT, CACHE_PREFIX_USER,
};
use crate::domain::UserResponse;
use crate::errors::{AppError, AppResult};

/// Raw string operations the application needs from a cache backend.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Count a hit in a fixed window that starts on the first hit.
    /// Returns the hit count and the seconds left in the window.
    async fn incr_window(&self, key: &str, window_seconds: u64) -> AppResult<(u64, u64)>;

    async fn ping(&self) -> AppResult<()>;
}

/// Redis-backed store over a multiplexed connection manager.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection.clone();
        conn.get(key).await.map_err(cache_error)
    }

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(cache_error)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key).await.map_err(cache_error)
    }

    async fn incr_window(&self, key: &str, window_seconds: u64) -> AppResult<(u64, u64)> {
        let mut conn = self.connection.clone();

        let count: i64 = conn.incr(key, 1).await.map_err(cache_error)?;
        if count == 1 {
            conn.expire::<_, ()>(key, window_seconds as i64)
                .await
                .map_err(cache_error)?;
        }

        // -1 means the key lost its expiry (e.g. a crash between INCR and
        // EXPIRE); give it a fresh window instead of blocking forever.
        let mut ttl: i64 = conn.ttl(key).await.map_err(cache_error)?;
        if ttl < 0 {
            conn.expire::<_, ()>(key, window_seconds as i64)
                .await
                .map_err(cache_error)?;
            ttl = window_seconds as i64;
        }

        Ok((count.max(0) as u64, ttl as u64))
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(CACHE_KEY_HEALTH, "ok", 10)
            .await
            .map_err(cache_error)
    }
}

/// Outcome of one rate-limited request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub count: u64,
    pub limit: u64,
    pub reset_after: u64,
}

impl RateLimitStatus {
    pub fn allowed(&self) -> bool {
        self.count <= self.limit
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.count)
    }
}

/// Typed cache over any `CacheStore`.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    default_ttl: u64,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: u64) -> Self {
        Self { store, default_ttl }
    }

    /// Connect to the Redis instance named in the config.
    pub async fn connect(config: &Config) -> Result<Self, RedisError> {
        let store = RedisStore::connect(&config.redis_url).await?;
        tracing::info!("Redis cache connected");
        Ok(Self::new(Arc::new(store), config.user_cache_ttl_seconds))
    }

    // =========================================================================
    // Generic Cache Operations
    // =========================================================================

    /// Get a value from cache.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.store.get(key).await? {
            Some(json) => {
                let parsed = serde_json::from_str(&json).map_err(|e| {
                    AppError::internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a value in cache with default TTL.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// Set a value in cache with custom TTL (in seconds).
    pub async fn set_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Cache serialization error: {}", e)))?;
        self.store.set_ex(key, json, ttl_seconds).await
    }

    pub async fn delete(&self, key: &str) -> AppResult<()> {
        self.store.delete(key).await
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }

    // =========================================================================
    // User Cache Operations
    // =========================================================================

    pub async fn get_user(&self, user_id: i64) -> AppResult<Option<UserResponse>> {
        self.get(&user_key(user_id)).await
    }

    pub async fn set_user(&self, user: &UserResponse) -> AppResult<()> {
        self.set(&user_key(user.id), user).await
    }

    pub async fn invalidate_user(&self, user_id: i64) -> AppResult<()> {
        self.delete(&user_key(user_id)).await
    }

    pub async fn get_user_list(&self) -> AppResult<Option<Vec<UserResponse>>> {
        self.get(CACHE_KEY_USER_LIST).await
    }

    pub async fn set_user_list(&self, users: &[UserResponse]) -> AppResult<()> {
        self.set(CACHE_KEY_USER_LIST, users).await
    }

    pub async fn invalidate_user_list(&self) -> AppResult<()> {
        self.delete(CACHE_KEY_USER_LIST).await
    }

    // =========================================================================
    // Rate Limiting Operations
    // =========================================================================

    /// Count a request against `identifier` in a fixed window.
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<RateLimitStatus> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let (count, reset_after) = self.store.incr_window(&key, window_seconds).await?;

        Ok(RateLimitStatus {
            count,
            limit: max_requests,
            reset_after,
        })
    }
}

fn user_key(user_id: i64) -> String {
    format!("{}{}", CACHE_PREFIX_USER, user_id)
}

/// Convert Redis error to AppError.
fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::Cache(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::domain::{UserRole, UserStatus};

    #[derive(Default)]
    struct MemoryStore {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl CacheStore for MemoryStore {
        async fn get(&self, key: &str) -> AppResult<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set_ex(&self, key: &str, value: String, _ttl: u64) -> AppResult<()> {
            self.entries.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        async fn incr_window(&self, key: &str, window: u64) -> AppResult<(u64, u64)> {
            let mut entries = self.entries.lock().unwrap();
            let count = entries
                .get(key)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
                + 1;
            entries.insert(key.to_string(), count.to_string());
            Ok((count, window))
        }

        async fn ping(&self) -> AppResult<()> {
            Ok(())
        }
    }

    fn cache() -> Cache {
        Cache::new(Arc::new(MemoryStore::default()), 60)
    }

    fn user(id: i64) -> UserResponse {
        UserResponse {
            id,
            email: format!("user{}@example.com", id),
            first_name: "Test".into(),
            last_name: "User".into(),
            phone: None,
            role: UserRole::User,
            status: UserStatus::Active,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cache_key_prefixes() {
        assert_eq!(user_key(42), "user:42");
        assert_eq!(CACHE_KEY_USER_LIST, "users:list");
        assert_eq!(CACHE_PREFIX_RATE_LIMIT, "rate_limit:");
    }

    #[tokio::test]
    async fn test_user_roundtrip_and_invalidation() {
        let cache = cache();
        assert!(cache.get_user(1).await.unwrap().is_none());

        cache.set_user(&user(1)).await.unwrap();
        let cached = cache.get_user(1).await.unwrap().unwrap();
        assert_eq!(cached.email, "user1@example.com");

        cache.invalidate_user(1).await.unwrap();
        assert!(cache.get_user(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_list_is_cached_under_one_key() {
        let cache = cache();
        cache.set_user_list(&[user(1), user(2)]).await.unwrap();
        assert_eq!(cache.get_user_list().await.unwrap().unwrap().len(), 2);

        cache.invalidate_user_list().await.unwrap();
        assert!(cache.get_user_list().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_blocks_after_limit() {
        let cache = cache();
        for expected in 1..=3u64 {
            let status = cache.check_rate_limit("1.2.3.4:/x", 3, 30).await.unwrap();
            assert_eq!(status.count, expected);
            assert!(status.allowed());
        }

        let status = cache.check_rate_limit("1.2.3.4:/x", 3, 30).await.unwrap();
        assert!(!status.allowed());
        assert_eq!(status.remaining(), 0);
        assert_eq!(status.reset_after, 30);
    }
}
