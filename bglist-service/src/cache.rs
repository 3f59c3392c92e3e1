//! Page caches
//!
//! A [`PageCache`] stores opaque bytes under a string key with a per-entry
//! TTL. Two backends share that contract: [`MemoryCache`] (process-local)
//! and, with the `cache` feature, [`RedisCache`] (shared across instances).
//! [`CacheGate`] sits in front of either and speaks JSON.
//!
//! There is no stampede protection and no invalidation on writes: concurrent
//! misses for one key each run the query and the last write wins, and a
//! cached page may be stale for up to one TTL after an update.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[cfg(feature = "cache")]
use deadpool_redis::{Config as DeadpoolConfig, Pool, Runtime};
#[cfg(feature = "cache")]
use redis::AsyncCommands;

#[cfg(feature = "cache")]
use crate::config::RedisConfig;
use crate::error::Result;

/// Key/bytes store with get and set-with-TTL
#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Short backend name for logs
    fn backend(&self) -> &'static str;
}

struct Entry {
    expires_at: Instant,
    value: Vec<u8>,
}

/// Process-local cache backed by a concurrent map
///
/// Expired entries are dropped on read, and a `set` sweeps the whole map
/// once the previous sweep is older than the TTL being written.
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    next_sweep: Mutex<Instant>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
            next_sweep: Mutex::new(Instant::now()),
        }
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones not yet swept included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep_if_due(&self, now: Instant, ttl: Duration) {
        {
            let mut next_sweep = self
                .next_sweep
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if now < *next_sweep {
                return;
            }
            *next_sweep = now + ttl;
        }

        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let swept = before.saturating_sub(self.entries.len());
        if swept > 0 {
            tracing::debug!(cache = "memory", swept, "expired entries swept");
        }
    }
}

#[async_trait]
impl PageCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        self.sweep_if_due(now, ttl);
        self.entries.insert(
            key.to_string(),
            Entry {
                expires_at: now + ttl,
                value,
            },
        );
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Redis-backed cache shared by every instance pointing at the same server
#[cfg(feature = "cache")]
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
    key_prefix: String,
}

#[cfg(feature = "cache")]
impl RedisCache {
    pub fn new(pool: Pool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| crate::error::Error::Cache(format!("Failed to get Redis connection: {}", e)))
    }
}

#[cfg(feature = "cache")]
#[async_trait]
impl PageCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = conn.get(self.key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.set_ex(self.key(key), value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// JSON read-through front for a [`PageCache`]
#[derive(Clone)]
pub struct CacheGate {
    backend: Arc<dyn PageCache>,
    ttl: Duration,
}

impl CacheGate {
    pub fn new(backend: Arc<dyn PageCache>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Gate over a fresh process-local cache
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryCache::new()), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value for `key`; an undecodable payload counts as a miss
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(bytes) = self.backend.get(key).await? else {
            tracing::debug!(cache = self.backend.backend(), key, "cache miss");
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                tracing::debug!(cache = self.backend.backend(), key, "cache hit");
                Ok(Some(value))
            }
            Err(e) => {
                tracing::warn!(
                    cache = self.backend.backend(),
                    key,
                    error = %e,
                    "discarding undecodable cache entry"
                );
                Ok(None)
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.set(key, bytes, self.ttl).await
    }
}

impl fmt::Debug for CacheGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheGate")
            .field("backend", &self.backend.backend())
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Create a Redis connection pool with retry logic
///
/// Uses exponential backoff between attempts.
#[cfg(feature = "cache")]
pub(crate) async fn create_pool(config: &RedisConfig) -> Result<Pool> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_pool(config).await {
            Ok(pool) => {
                if attempt > 0 {
                    tracing::info!(
                        "Redis connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        "Redis connection pool created: max_connections={}",
                        config.max_connections
                    );
                }
                return Ok(pool);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        "Failed to connect to Redis after {} attempts: {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay * 2_u32.pow(attempt.saturating_sub(1));

                tracing::warn!(
                    "Redis connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Attempt to create a Redis pool (single try)
#[cfg(feature = "cache")]
async fn try_create_pool(config: &RedisConfig) -> Result<Pool> {
    let pool = DeadpoolConfig::from_url(&config.url)
        .builder()
        .map_err(|e| crate::error::Error::Cache(format!("Failed to build Redis pool: {}", e)))?
        .max_size(config.max_connections)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| crate::error::Error::Cache(format!("Failed to create Redis pool: {}", e)))?;

    // Test the connection
    let conn = pool
        .get()
        .await
        .map_err(|e| crate::error::Error::Cache(format!("Failed to get Redis connection: {}", e)))?;
    drop(conn);

    Ok(pool)
}
