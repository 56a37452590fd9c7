//! In-process cache using DashMap, with lazily enforced TTLs.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// Expiry used when `now + ttl` does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Single-process cache with per-entry time-to-live.
///
/// Expired entries are dropped on the next read of their key.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    data: Arc<DashMap<String, CacheEntry>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored bytes unless the entry is missing or expired.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let expired = match self.data.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.data
                .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
        }
        None
    }

    /// Stores bytes that expire after `ttl`.
    pub fn set(&self, key: &str, value: &[u8], ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        self.data.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_vec(),
                expires_at,
            },
        );
    }

    /// Drops a key.
    pub fn delete(&self, key: &str) {
        self.data.remove(key);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.data.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
