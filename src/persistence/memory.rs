//! Ephemeral in-process item store.
//!
//! Used when the database is disabled or unreachable at startup. State
//! lives for the lifetime of the process only: a restart starts empty.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{Item, ItemId, ItemPatch, NewItem, now};
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct Ledger {
    last_id: i64,
    // ids only grow, so key order is insertion order
    items: BTreeMap<ItemId, Item>,
}

/// Mutex-guarded ordered collection with a monotonically increasing id
/// counter.
///
/// Every operation takes the same lock for its whole critical section
/// and hands out clones, never references into the collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryItemStore {
    ledger: Arc<Mutex<Ledger>>,
}

impl MemoryItemStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next id and stores the item.
    pub async fn insert(&self, new: NewItem) -> Item {
        let mut ledger = self.ledger.lock().await;
        ledger.last_id += 1;
        let id = ItemId::new(ledger.last_id);
        let at = now();
        let item = Item {
            id,
            name: new.name,
            description: new.description,
            created_at: at,
            updated_at: at,
        };
        ledger.items.insert(id, item.clone());
        item
    }

    /// Returns a copy of one item.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the id is unknown.
    pub async fn get(&self, id: ItemId) -> Result<Item, GatewayError> {
        self.ledger
            .lock()
            .await
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    /// Returns a copy of every item in insertion order.
    pub async fn list(&self) -> Vec<Item> {
        self.ledger.lock().await.items.values().cloned().collect()
    }

    /// Applies a patch and refreshes `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the id is unknown.
    pub async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<Item, GatewayError> {
        let mut ledger = self.ledger.lock().await;
        let item = ledger
            .items
            .get_mut(&id)
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
        patch.apply(item, now());
        Ok(item.clone())
    }

    /// Removes an item.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the id is unknown, including
    /// when it was already deleted.
    pub async fn delete(&self, id: ItemId) -> Result<(), GatewayError> {
        self.ledger
            .lock()
            .await
            .items
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.ledger.lock().await.items.len()
    }

    #[cfg(test)]
    async fn is_empty(&self) -> bool {
        self.ledger.lock().await.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn new_item(name: &str) -> NewItem {
        let Ok(item) = NewItem::new(name.to_string(), String::new()) else {
            panic!("valid item");
        };
        item
    }

    #[tokio::test]
    async fn ids_start_at_one_and_increase() {
        let store = MemoryItemStore::new();
        let a = store.insert(new_item("a")).await;
        let b = store.insert(new_item("b")).await;
        assert_eq!(a.id, ItemId::new(1));
        assert_eq!(b.id, ItemId::new(2));
        assert_eq!(a.created_at, a.updated_at);
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = MemoryItemStore::new();
        assert!(store.list().await.is_empty());
        for name in ["c", "a", "b"] {
            store.insert(new_item(name)).await;
        }
        let names: Vec<String> = store.list().await.into_iter().map(|i| i.name).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = MemoryItemStore::new();
        let a = store.insert(new_item("a")).await;
        assert!(store.delete(a.id).await.is_ok());
        let b = store.insert(new_item("b")).await;
        assert_eq!(b.id, ItemId::new(2));
    }

    #[tokio::test]
    async fn update_and_delete_missing_report_not_found() {
        let store = MemoryItemStore::new();
        let missing = ItemId::new(9);
        assert!(matches!(
            store.update(missing, ItemPatch::default()).await,
            Err(GatewayError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(missing).await,
            Err(GatewayError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let store = MemoryItemStore::new();
        let a = store.insert(new_item("a")).await;
        assert!(store.delete(a.id).await.is_ok());
        assert!(matches!(
            store.delete(a.id).await,
            Err(GatewayError::NotFound(_))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn returned_items_are_copies() {
        let store = MemoryItemStore::new();
        let mut a = store.insert(new_item("a")).await;
        a.name = "mutated".to_string();
        let Ok(stored) = store.get(a.id).await else {
            panic!("item must exist");
        };
        assert_eq!(stored.name, "a");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_get_unique_ids() {
        let store = MemoryItemStore::new();
        let mut handles = Vec::new();
        for n in 0..200 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(new_item(&format!("item-{n}"))).await.id
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            let Ok(id) = handle.await else {
                panic!("insert task panicked");
            };
            ids.insert(id);
        }
        assert_eq!(ids.len(), 200);
        assert_eq!(store.len().await, 200);
    }
}
