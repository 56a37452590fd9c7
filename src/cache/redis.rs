//! Redis cache backend over a `ConnectionManager`.

use std::fmt;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{Client, FromRedisValue, RedisError};

use super::CacheError;
use crate::connect::{CacheTarget, Establishment, RetryPolicy, establish};

/// Redis-backed cache with a bounded timeout on every command.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Connects to `url` and verifies the connection with `PING`,
    /// retrying according to `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Redis`] if the URL cannot be parsed.
    /// Unreachability is reported through [`Establishment::Unreachable`].
    pub async fn connect(
        url: &str,
        policy: &RetryPolicy,
        op_timeout: Duration,
    ) -> Result<Establishment<Self, RedisError>, CacheError> {
        let client = Client::open(url)?;
        let shown = CacheTarget::Redis(url.to_string());

        let outcome = establish(policy, "cache", &shown, || {
            let client = client.clone();
            async move {
                let mut conn = client.get_connection_manager().await?;
                redis::cmd("PING")
                    .query_async::<_, String>(&mut conn)
                    .await?;
                Ok::<_, RedisError>(conn)
            }
        })
        .await;

        Ok(outcome.map(|conn| Self { conn, op_timeout }))
    }

    async fn run<T: FromRedisValue>(&self, cmd: redis::Cmd) -> Result<T, CacheError> {
        let mut conn = self.conn.clone();
        tokio::time::timeout(self.op_timeout, cmd.query_async::<_, T>(&mut conn))
            .await
            .map_err(|_| CacheError::Timeout(self.op_timeout))?
            .map_err(CacheError::from)
    }

    /// `GET key`.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] on Redis failure or timeout.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.run(cmd).await
    }

    /// `SET key value EX ttl`.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] on Redis failure or timeout.
    pub async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(ttl.as_secs().max(1));
        self.run(cmd).await
    }

    /// `DEL key`.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] on Redis failure or timeout.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        self.run(cmd).await
    }
}
