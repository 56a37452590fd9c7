//! Side cache for single-item reads.
//!
//! [`CacheProvider`] uses enum dispatch over the configured backend:
//!
//! ```text
//! CacheProvider
//!   ├── Redis(RedisCache)       <- shared cache, every command time-bounded
//!   ├── InProcess(MemoryCache)  <- DashMap with TTLs, single instance only
//!   └── Absent                  <- always miss, always succeed
//! ```
//!
//! The cache is never a source of truth. Callers treat every error as a
//! miss and carry on.

pub mod error;
pub mod memory;
pub mod redis;

use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

pub use error::CacheError;
pub use memory::MemoryCache;
pub use self::redis::RedisCache;

use crate::domain::ItemId;

/// Namespace prefix for item snapshot keys.
pub const ITEM_KEY_PREFIX: &str = "item";

/// Cache key for one item snapshot, e.g. `item:42`.
#[must_use]
pub fn item_key(id: ItemId) -> String {
    format!("{ITEM_KEY_PREFIX}:{id}")
}

/// Whether a cache is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// A cache backend answered its liveness probe.
    Present,
    /// No cache configured, or it failed its probe at startup.
    Absent,
}

/// The cache backend for the lifetime of the process.
#[derive(Debug, Clone)]
pub enum CacheProvider {
    /// Redis server.
    Redis(RedisCache),
    /// In-process TTL map.
    InProcess(MemoryCache),
    /// No cache.
    Absent,
    /// Present but failing every round trip.
    #[cfg(test)]
    Unavailable,
}

impl CacheProvider {
    /// Returns the active cache mode.
    #[must_use]
    pub const fn mode(&self) -> CacheMode {
        match self {
            Self::Redis(_) | Self::InProcess(_) => CacheMode::Present,
            Self::Absent => CacheMode::Absent,
            #[cfg(test)]
            Self::Unavailable => CacheMode::Present,
        }
    }

    /// Looks up raw bytes. `Ok(None)` on a miss or when absent.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the Redis round trip fails.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match self {
            Self::Redis(redis) => redis.get(key).await,
            Self::InProcess(mem) => Ok(mem.get(key)),
            Self::Absent => Ok(None),
            #[cfg(test)]
            Self::Unavailable => Err(CacheError::Timeout(Duration::ZERO)),
        }
    }

    /// Stores raw bytes with a time-to-live.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the Redis round trip fails.
    pub async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        match self {
            Self::Redis(redis) => redis.set(key, value, ttl).await,
            Self::InProcess(mem) => {
                mem.set(key, value, ttl);
                Ok(())
            }
            Self::Absent => Ok(()),
            #[cfg(test)]
            Self::Unavailable => Err(CacheError::Timeout(Duration::ZERO)),
        }
    }

    /// Removes a key.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the Redis round trip fails.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            Self::Redis(redis) => redis.delete(key).await,
            Self::InProcess(mem) => {
                mem.delete(key);
                Ok(())
            }
            Self::Absent => Ok(()),
            #[cfg(test)]
            Self::Unavailable => Err(CacheError::Timeout(Duration::ZERO)),
        }
    }
}
