//! Cache error type. Never surfaced to HTTP callers.

use std::time::Duration;

/// Failure of a single cache round trip.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The Redis client reported an error.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The operation did not finish in time.
    #[error("cache operation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}
