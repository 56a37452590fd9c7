//! Item service: cache-aside reads, invalidate-after-write mutations.

use std::time::Duration;

use crate::cache::{CacheProvider, item_key};
use crate::degradation::DegradationPolicy;
use crate::domain::{Item, ItemId, ItemPatch, NewItem};
use crate::error::GatewayError;
use crate::persistence::ItemStore;

/// Outcome of a single-item read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRead {
    /// Serialized snapshot straight from the cache, to be returned
    /// byte-for-byte.
    Cached(Vec<u8>),
    /// Freshly loaded from the store.
    Stored(Item),
}

impl ItemRead {
    /// Returns `true` when the read was answered by the cache.
    #[must_use]
    pub const fn is_cache_hit(&self) -> bool {
        matches!(self, Self::Cached(_))
    }

    /// Decodes the read into an [`Item`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if a cached snapshot is not a
    /// valid item.
    pub fn into_item(self) -> Result<Item, GatewayError> {
        match self {
            Self::Stored(item) => Ok(item),
            Self::Cached(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| GatewayError::Internal(format!("corrupt cached item: {e}"))),
        }
    }
}

/// Orchestration layer for item operations.
///
/// Owns the store and the cache chosen at startup. Point reads consult
/// the cache first; updates and deletes invalidate the cached snapshot
/// strictly after the store mutation succeeded. Cache failures are
/// logged and never fail the surrounding operation.
#[derive(Debug, Clone)]
pub struct ItemService {
    store: ItemStore,
    cache: CacheProvider,
    cache_ttl: Duration,
}

impl ItemService {
    /// Creates a new `ItemService`.
    #[must_use]
    pub fn new(store: ItemStore, cache: CacheProvider, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache,
            cache_ttl,
        }
    }

    /// Returns a reference to the inner [`ItemStore`].
    #[must_use]
    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    /// Backend modes this service runs with.
    #[must_use]
    pub fn policy(&self) -> DegradationPolicy {
        DegradationPolicy::of(&self.store, &self.cache)
    }

    /// Creates an item. The cache is not touched.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the store write fails.
    pub async fn create(&self, new: NewItem) -> Result<Item, GatewayError> {
        let item = self.store.insert(new).await?;
        tracing::info!(id = %item.id, "item created");
        Ok(item)
    }

    /// Reads one item, cache first.
    ///
    /// On a miss the store is read and the snapshot cached for the
    /// configured TTL. A hit may lag a concurrent update by at most the
    /// TTL.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the item does not exist.
    pub async fn get(&self, id: ItemId) -> Result<ItemRead, GatewayError> {
        let key = item_key(id);

        match self.cache.get(&key).await {
            Ok(Some(bytes)) if !bytes.trim_ascii().is_empty() => {
                tracing::debug!(%key, "cache hit");
                return Ok(ItemRead::Cached(bytes));
            }
            Ok(_) => tracing::debug!(%key, "cache miss"),
            Err(e) => tracing::warn!(%key, error = %e, "cache read failed, reading store"),
        }

        let item = self.store.get(id).await?;

        match serde_json::to_vec(&item) {
            Ok(bytes) => {
                if let Err(e) = self.cache.set(&key, &bytes, self.cache_ttl).await {
                    tracing::warn!(%key, error = %e, "cache populate failed");
                }
            }
            Err(e) => tracing::warn!(%key, error = %e, "item serialization failed"),
        }

        Ok(ItemRead::Stored(item))
    }

    /// Lists every item, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the store read fails.
    pub async fn list(&self) -> Result<Vec<Item>, GatewayError> {
        self.store.list().await
    }

    /// Confirms the item exists without consulting the cache.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the item does not exist.
    pub async fn ensure_exists(&self, id: ItemId) -> Result<(), GatewayError> {
        self.store.get(id).await.map(|_| ())
    }

    /// Applies a patch, then invalidates the cached snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the item does not exist.
    pub async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<Item, GatewayError> {
        let item = self.store.update(id, patch).await?;
        self.invalidate(id).await;
        tracing::info!(%id, "item updated");
        Ok(item)
    }

    /// Deletes an item, then invalidates the cached snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the item does not exist or
    /// was already deleted.
    pub async fn delete(&self, id: ItemId) -> Result<(), GatewayError> {
        self.store.delete(id).await?;
        self.invalidate(id).await;
        tracing::info!(%id, "item deleted");
        Ok(())
    }

    async fn invalidate(&self, id: ItemId) {
        let key = item_key(id);
        if let Err(e) = self.cache.delete(&key).await {
            tracing::warn!(%key, error = %e, "cache invalidation failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::cache::{CacheMode, MemoryCache};
    use crate::persistence::StoreMode;

    const TTL: Duration = Duration::from_secs(600);

    fn make_service() -> (ItemService, MemoryCache) {
        let cache = MemoryCache::new();
        let service = ItemService::new(
            ItemStore::ephemeral(),
            CacheProvider::InProcess(cache.clone()),
            TTL,
        );
        (service, cache)
    }

    fn new_item(name: &str) -> NewItem {
        let Ok(item) = NewItem::new(name.to_string(), format!("{name} description")) else {
            panic!("valid item");
        };
        item
    }

    fn rename(name: &str) -> ItemPatch {
        let Ok(patch) = ItemPatch::new(Some(name.to_string()), None) else {
            panic!("valid patch");
        };
        patch
    }

    async fn read(service: &ItemService, id: ItemId) -> ItemRead {
        let Ok(read) = service.get(id).await else {
            panic!("item {id} must exist");
        };
        read
    }

    #[tokio::test]
    async fn get_returns_what_create_returned() {
        let (service, _) = make_service();
        let Ok(created) = service.create(new_item("a")).await else {
            panic!("create failed");
        };

        let first = read(&service, created.id).await;
        assert!(!first.is_cache_hit());
        let second = read(&service, created.id).await;
        assert!(second.is_cache_hit());

        assert_eq!(first.into_item().ok(), Some(created.clone()));
        assert_eq!(second.into_item().ok(), Some(created));
    }

    #[tokio::test]
    async fn create_does_not_populate_cache() {
        let (service, cache) = make_service();
        let Ok(created) = service.create(new_item("a")).await else {
            panic!("create failed");
        };
        assert!(cache.get(&item_key(created.id)).is_none());
    }

    #[tokio::test]
    async fn update_invalidates_cached_snapshot() {
        let (service, cache) = make_service();
        let Ok(created) = service.create(new_item("a")).await else {
            panic!("create failed");
        };
        read(&service, created.id).await;
        assert!(cache.get(&item_key(created.id)).is_some());

        let Ok(updated) = service.update(created.id, rename("a2")).await else {
            panic!("update failed");
        };
        assert!(cache.get(&item_key(created.id)).is_none());

        let after = read(&service, created.id).await;
        assert!(!after.is_cache_hit());
        let Ok(after) = after.into_item() else {
            panic!("decodable item");
        };
        assert_eq!(after.name, "a2");
        assert_eq!(after, updated);
        assert_eq!(after.created_at, created.created_at);
        assert!(after.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn delete_is_not_idempotent_and_invalidates() {
        let (service, cache) = make_service();
        let Ok(created) = service.create(new_item("a")).await else {
            panic!("create failed");
        };
        read(&service, created.id).await;

        assert!(service.delete(created.id).await.is_ok());
        assert!(cache.get(&item_key(created.id)).is_none());
        assert!(matches!(
            service.get(created.id).await,
            Err(GatewayError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(created.id).await,
            Err(GatewayError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn failed_update_leaves_cache_alone() {
        let (service, cache) = make_service();
        cache.set(&item_key(ItemId::new(5)), b"{\"sentinel\":true}", TTL);
        assert!(matches!(
            service.update(ItemId::new(5), rename("x")).await,
            Err(GatewayError::NotFound(_))
        ));
        assert!(cache.get(&item_key(ItemId::new(5))).is_some());
    }

    #[tokio::test]
    async fn cache_hit_bytes_are_returned_verbatim() {
        let (service, cache) = make_service();
        let raw = br#"{"id":1,"name":"from-cache"}"#;
        cache.set(&item_key(ItemId::new(1)), raw, TTL);

        let hit = read(&service, ItemId::new(1)).await;
        assert_eq!(hit, ItemRead::Cached(raw.to_vec()));
    }

    #[tokio::test]
    async fn blank_cached_value_counts_as_miss() {
        let (service, cache) = make_service();
        let Ok(created) = service.create(new_item("a")).await else {
            panic!("create failed");
        };
        cache.set(&item_key(created.id), b"  ", TTL);

        let got = read(&service, created.id).await;
        assert_eq!(got, ItemRead::Stored(created));
    }

    #[tokio::test(start_paused = true)]
    async fn staleness_is_bounded_by_ttl() {
        let (service, _) = make_service();
        let Ok(created) = service.create(new_item("a")).await else {
            panic!("create failed");
        };
        read(&service, created.id).await;

        // a writer that skips invalidation
        let Ok(_) = service.store().update(created.id, rename("behind")).await else {
            panic!("direct update failed");
        };
        let stale = read(&service, created.id).await.into_item().ok();
        assert_eq!(stale.map(|i| i.name).as_deref(), Some("a"));

        tokio::time::advance(TTL).await;
        let fresh = read(&service, created.id).await.into_item().ok();
        assert_eq!(fresh.map(|i| i.name).as_deref(), Some("behind"));
    }

    #[tokio::test]
    async fn works_without_cache() {
        let service = ItemService::new(ItemStore::ephemeral(), CacheProvider::Absent, TTL);
        assert_eq!(
            service.policy(),
            DegradationPolicy {
                store: StoreMode::Ephemeral,
                cache: CacheMode::Absent,
            }
        );
        let Ok(created) = service.create(new_item("a")).await else {
            panic!("create failed");
        };
        let again = read(&service, created.id).await;
        assert!(!again.is_cache_hit());
        assert_eq!(again.into_item().ok(), Some(created));
        assert!(matches!(service.list().await, Ok(items) if items.len() == 1));
    }

    #[tokio::test]
    async fn failing_cache_never_fails_operations() {
        let service = ItemService::new(ItemStore::ephemeral(), CacheProvider::Unavailable, TTL);
        assert_eq!(service.policy().cache, CacheMode::Present);
        let Ok(created) = service.create(new_item("a")).await else {
            panic!("create failed");
        };

        let got = read(&service, created.id).await;
        assert_eq!(got, ItemRead::Stored(created.clone()));

        let Ok(updated) = service.update(created.id, rename("a2")).await else {
            panic!("update must succeed despite cache errors");
        };
        assert_eq!(updated.name, "a2");
        let got = read(&service, created.id).await;
        assert_eq!(got, ItemRead::Stored(updated));

        assert!(service.delete(created.id).await.is_ok());
        assert!(matches!(
            service.get(created.id).await,
            Err(GatewayError::NotFound(_))
        ));
    }
}
