//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Parsing itself runs over a key lookup
//! function so it can be exercised without touching the process
//! environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::connect::{CacheTarget, DatabaseTarget, DiscreteTarget, RetryPolicy};
use crate::error::GatewayError;

/// Default cache URL when `REDIS_URL` is unset.
pub const DEFAULT_CACHE_URL: &str = "redis://localhost:6379";

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Resolved PostgreSQL target.
    pub database: DatabaseTarget,

    /// Whether `DATABASE_URL` or `DB_HOST` was set explicitly.
    pub database_configured: bool,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Minimum idle connections in the pool.
    pub database_min_connections: u32,

    /// Master switch for the persistent store.
    pub persistence_enabled: bool,

    /// Fall back to the in-memory store when the database is unreachable.
    pub store_fallback_enabled: bool,

    /// Cache target, `None` when the cache is disabled.
    pub cache: Option<CacheTarget>,

    /// Time-to-live of cached item snapshots.
    pub cache_ttl: Duration,

    /// Upper bound on every cache round trip.
    pub cache_op_timeout: Duration,

    /// Startup connection policy for the database.
    pub store_retry: RetryPolicy,

    /// Startup connection policy for the cache.
    pub cache_retry: RetryPolicy,

    /// Grace period for in-flight requests after a termination signal.
    pub shutdown_grace: Duration,

    /// Directory holding `index.html` and `assets/`.
    pub static_dir: PathBuf,

    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let probe_timeout = Duration::from_secs(3);
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database: DatabaseTarget::Discrete(DiscreteTarget::default()),
            database_configured: false,
            database_max_connections: 10,
            database_min_connections: 1,
            persistence_enabled: true,
            store_fallback_enabled: true,
            cache: Some(CacheTarget::from_url(DEFAULT_CACHE_URL)),
            cache_ttl: Duration::from_secs(600),
            cache_op_timeout: Duration::from_millis(2000),
            store_retry: RetryPolicy::new(3, Duration::from_secs(1), probe_timeout),
            cache_retry: RetryPolicy::new(2, Duration::from_secs(1), probe_timeout),
            shutdown_grace: Duration::from_secs(5),
            static_dir: PathBuf::from("public"),
            log_json: false,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// See [`GatewayConfig::from_lookup`].
    pub fn from_env() -> Result<Self, GatewayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset, except `REDIS_URL` where an empty
    /// value disables the cache. Numeric and boolean values that fail to
    /// parse fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfiguration`] if `LISTEN_ADDR`,
    /// `DB_PORT` or `SSL_MODE` cannot be parsed, and
    /// [`GatewayError::ConfigurationMissing`] if store fallback is disabled
    /// but no database is configured.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let listen_addr: SocketAddr = match (get("LISTEN_ADDR"), get("PORT")) {
            (Some(addr), _) => addr
                .parse()
                .map_err(|_| GatewayError::InvalidConfiguration {
                    key: "LISTEN_ADDR",
                    reason: format!("{addr:?} is not a socket address"),
                })?,
            (None, Some(port)) => {
                SocketAddr::from(([0, 0, 0, 0], parse_or(Some(port), defaults.listen_addr.port())))
            }
            (None, None) => defaults.listen_addr,
        };

        let (database, database_configured) = DatabaseTarget::resolve(&get)?;

        let persistence_enabled =
            parse_bool_or(get("PERSISTENCE_ENABLED"), defaults.persistence_enabled);
        let store_fallback_enabled =
            parse_bool_or(get("STORE_FALLBACK_ENABLED"), defaults.store_fallback_enabled);
        if persistence_enabled && !store_fallback_enabled && !database_configured {
            return Err(GatewayError::ConfigurationMissing(
                "DATABASE_URL or DB_HOST must be set when STORE_FALLBACK_ENABLED=false"
                    .to_string(),
            ));
        }

        let cache_enabled = parse_bool_or(get("CACHE_ENABLED"), true);
        let cache = match lookup("REDIS_URL") {
            _ if !cache_enabled => None,
            Some(url) if url.trim().is_empty() => None,
            Some(url) => Some(CacheTarget::from_url(url.trim())),
            None => defaults.cache,
        };

        let probe_timeout = Duration::from_secs(parse_or(get("PROBE_TIMEOUT_SECS"), 3));
        let base_delay = Duration::from_millis(parse_or(get("CONNECT_BACKOFF_MS"), 1000));

        Ok(Self {
            listen_addr,
            database,
            database_configured,
            database_max_connections: parse_or(
                get("DATABASE_MAX_CONNECTIONS"),
                defaults.database_max_connections,
            ),
            database_min_connections: parse_or(
                get("DATABASE_MIN_CONNECTIONS"),
                defaults.database_min_connections,
            ),
            persistence_enabled,
            store_fallback_enabled,
            cache,
            cache_ttl: Duration::from_secs(parse_or(get("CACHE_TTL_SECS"), 600)),
            cache_op_timeout: Duration::from_millis(parse_or(get("CACHE_OP_TIMEOUT_MS"), 2000)),
            store_retry: RetryPolicy::new(
                parse_or(get("CONNECT_ATTEMPTS"), 3),
                base_delay,
                probe_timeout,
            ),
            cache_retry: RetryPolicy::new(
                parse_or(get("CACHE_CONNECT_ATTEMPTS"), 2),
                base_delay,
                probe_timeout,
            ),
            shutdown_grace: Duration::from_secs(parse_or(get("SHUTDOWN_GRACE_SECS"), 5)),
            static_dir: get("STATIC_DIR").map_or(defaults.static_dir, PathBuf::from),
            log_json: get("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }
}

/// Parses a value as `T`, returning `default` on missing or invalid values.
fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Parses a boolean. Accepts `"true"`, `"1"`, `"false"`, `"0"`
/// (case-insensitive). Returns `default` otherwise.
fn parse_bool_or(value: Option<String>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
