//! Key/value cache capability used to persist tickets
//!
//! Caching is opt-in. [`NoOpCache`] is the null object: it never stores
//! anything, so the ticket store falls back to its in-memory slot.
//! [`MemoryCache`] is a process-local cache built on `moka` with per-entry
//! expiry; share one instance between clients to share tickets.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use ticketauth_common::cache::{KeyValueCache, MemoryCache};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ticketauth_common::error::BoxError> {
//! let cache = MemoryCache::new(100);
//! cache.put("ticket", "TGT-1".to_string(), Some(Duration::from_secs(60))).await?;
//! assert_eq!(cache.get("ticket").await?, Some("TGT-1".to_string()));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;

use crate::error::BoxError;

/// Store and retrieve string values by key with optional expiry.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Fetch a value; `Ok(None)` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError>;

    /// Store a value, replacing any previous one. `ttl = None` keeps the
    /// entry until evicted.
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), BoxError>;
}

#[async_trait]
impl<T> KeyValueCache for Arc<T>
where
    T: KeyValueCache + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), BoxError> {
        (**self).put(key, value, ttl).await
    }
}

/// Cache that stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCache;

#[async_trait]
impl KeyValueCache for NoOpCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, BoxError> {
        Ok(None)
    }

    async fn put(
        &self,
        _key: &str,
        _value: String,
        _ttl: Option<Duration>,
    ) -> Result<(), BoxError> {
        // No-op
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CachedValue {
    value: String,
    ttl: Option<Duration>,
}

struct PerEntryExpiry;

impl Expiry<String, CachedValue> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// In-process cache with per-entry time-to-live
#[derive(Clone)]
pub struct MemoryCache {
    inner: Cache<String, CachedValue>,
}

impl MemoryCache {
    /// Create a cache holding at most `max_capacity` entries.
    pub fn new(max_capacity: u64) -> Self {
        let inner =
            Cache::builder().max_capacity(max_capacity).expire_after(PerEntryExpiry).build();
        Self { inner }
    }

    /// Number of live entries (approximate until pending tasks run).
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(1_000)
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache").field("entry_count", &self.inner.entry_count()).finish()
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        Ok(self.inner.get(key).await.map(|cached| cached.value))
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), BoxError> {
        self.inner.insert(key.to_string(), CachedValue { value, ttl }).await;
        Ok(())
    }
}
