//! Degradation policy: which store and which cache the process runs with.
//!
//! Decided once at startup from the two connection outcomes and never
//! revisited. A backend that is unreachable at startup stays unused for
//! the lifetime of the process.

use serde::Serialize;
use utoipa::ToSchema;

use crate::cache::{CacheMode, CacheProvider, MemoryCache, RedisCache};
use crate::config::GatewayConfig;
use crate::connect::{CacheTarget, Establishment, redact_url};
use crate::error::{Backend, GatewayError};
use crate::persistence::{ItemStore, PostgresItemStore, StoreMode};

/// Active backend modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DegradationPolicy {
    /// Store backend.
    pub store: StoreMode,
    /// Cache backend.
    pub cache: CacheMode,
}

impl DegradationPolicy {
    /// Reads the modes off the chosen backends.
    #[must_use]
    pub const fn of(store: &ItemStore, cache: &CacheProvider) -> Self {
        Self {
            store: store.mode(),
            cache: cache.mode(),
        }
    }
}

/// Backends chosen at startup.
#[derive(Debug, Clone)]
pub struct Backends {
    /// Item store.
    pub store: ItemStore,
    /// Side cache.
    pub cache: CacheProvider,
}

impl Backends {
    /// Modes of these backends.
    #[must_use]
    pub const fn policy(&self) -> DegradationPolicy {
        DegradationPolicy::of(&self.store, &self.cache)
    }
}

/// Connects the store and the cache independently and settles the policy.
///
/// # Errors
///
/// Returns a [`GatewayError`] only when the database is unusable and
/// store fallback is disabled. The cache never fails startup.
pub async fn bootstrap(config: &GatewayConfig) -> Result<Backends, GatewayError> {
    let (store, cache) = tokio::join!(connect_store(config), connect_cache(config));
    let backends = Backends {
        store: store?,
        cache,
    };
    let policy = backends.policy();
    tracing::info!(store = ?policy.store, cache = ?policy.cache, "backends ready");
    Ok(backends)
}

/// Picks the item store.
///
/// # Errors
///
/// Returns [`GatewayError::ConnectionUnreachable`] or
/// [`GatewayError::InvalidConfiguration`] when the database cannot be used
/// and `store_fallback_enabled` is off.
pub async fn connect_store(config: &GatewayConfig) -> Result<ItemStore, GatewayError> {
    if !config.persistence_enabled {
        tracing::info!("persistence disabled, using ephemeral store");
        return Ok(ItemStore::ephemeral());
    }

    let outcome = PostgresItemStore::connect(
        &config.database,
        &config.store_retry,
        config.database_max_connections,
        config.database_min_connections,
    )
    .await;

    match outcome {
        Ok(Establishment::Connected { handle, .. }) => {
            if let Err(e) = handle.ensure_schema().await {
                tracing::warn!(error = %e, "schema creation failed, continuing");
            }
            Ok(ItemStore::Persistent(handle))
        }
        Ok(Establishment::Unreachable {
            last_error,
            attempts,
        }) => fall_back(
            config,
            GatewayError::ConnectionUnreachable {
                backend: Backend::Store,
                attempts,
                reason: redact_url(&last_error.to_string()),
            },
        ),
        Err(e) => fall_back(config, e),
    }
}

fn fall_back(config: &GatewayConfig, error: GatewayError) -> Result<ItemStore, GatewayError> {
    if !config.store_fallback_enabled {
        tracing::error!(error = %error, "database not available and fallback disabled");
        return Err(error);
    }
    tracing::warn!(
        error = %error,
        "database not available, running with ephemeral store; data will not survive a restart"
    );
    Ok(ItemStore::ephemeral())
}

/// Picks the cache. Missing configuration and failed probes both end up
/// as [`CacheProvider::Absent`].
pub async fn connect_cache(config: &GatewayConfig) -> CacheProvider {
    let url = match &config.cache {
        None => {
            tracing::info!("cache disabled");
            return CacheProvider::Absent;
        }
        Some(CacheTarget::InProcess) => {
            tracing::info!("using in-process cache");
            return CacheProvider::InProcess(MemoryCache::new());
        }
        Some(CacheTarget::Redis(url)) => url,
    };

    match RedisCache::connect(url, &config.cache_retry, config.cache_op_timeout).await {
        Ok(Establishment::Connected { handle, .. }) => CacheProvider::Redis(handle),
        Ok(Establishment::Unreachable {
            last_error,
            attempts,
        }) => {
            tracing::warn!(
                attempts,
                error = %redact_url(&last_error.to_string()),
                "cache not available, continuing without cache"
            );
            CacheProvider::Absent
        }
        Err(e) => {
            tracing::warn!(
                error = %redact_url(&e.to_string()),
                "cache misconfigured, continuing without cache"
            );
            CacheProvider::Absent
        }
    }
}
