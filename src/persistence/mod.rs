//! Persistence layer: the item store and its two backends.
//!
//! [`ItemStore`] dispatches every operation to whichever backend the
//! degradation policy selected at startup: PostgreSQL via `sqlx`, or the
//! mutex-guarded in-memory fallback.

pub mod memory;
pub mod postgres;

use serde::Serialize;
use utoipa::ToSchema;

pub use memory::MemoryItemStore;
pub use postgres::PostgresItemStore;

use crate::domain::{Item, ItemId, ItemPatch, NewItem};
use crate::error::GatewayError;

/// Which backend satisfies the item store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// PostgreSQL is reachable.
    Persistent,
    /// In-memory fallback; contents are lost on restart.
    Ephemeral,
}

/// The item store for the lifetime of the process.
#[derive(Debug, Clone)]
pub enum ItemStore {
    /// Backed by PostgreSQL.
    Persistent(PostgresItemStore),
    /// Backed by the in-memory fallback.
    Ephemeral(MemoryItemStore),
}

impl ItemStore {
    /// Creates an empty ephemeral store.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::Ephemeral(MemoryItemStore::new())
    }

    /// Returns the active backend mode.
    #[must_use]
    pub const fn mode(&self) -> StoreMode {
        match self {
            Self::Persistent(_) => StoreMode::Persistent,
            Self::Ephemeral(_) => StoreMode::Ephemeral,
        }
    }

    /// Stores a new item and returns it with its assigned id and
    /// timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BackendTransient`] if the database write
    /// fails.
    pub async fn insert(&self, new: NewItem) -> Result<Item, GatewayError> {
        match self {
            Self::Persistent(db) => db.insert(new).await,
            Self::Ephemeral(mem) => Ok(mem.insert(new).await),
        }
    }

    /// Loads one item.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for unknown ids and
    /// [`GatewayError::BackendTransient`] on database failure.
    pub async fn get(&self, id: ItemId) -> Result<Item, GatewayError> {
        match self {
            Self::Persistent(db) => db.get(id).await,
            Self::Ephemeral(mem) => mem.get(id).await,
        }
    }

    /// Loads every item; empty when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BackendTransient`] on database failure.
    pub async fn list(&self) -> Result<Vec<Item>, GatewayError> {
        match self {
            Self::Persistent(db) => db.list().await,
            Self::Ephemeral(mem) => Ok(mem.list().await),
        }
    }

    /// Applies a patch to an existing item.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for unknown ids and
    /// [`GatewayError::BackendTransient`] on database failure.
    pub async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<Item, GatewayError> {
        match self {
            Self::Persistent(db) => db.update(id, patch).await,
            Self::Ephemeral(mem) => mem.update(id, patch).await,
        }
    }

    /// Deletes an existing item.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for unknown or already deleted
    /// ids and [`GatewayError::BackendTransient`] on database failure.
    pub async fn delete(&self, id: ItemId) -> Result<(), GatewayError> {
        match self {
            Self::Persistent(db) => db.delete(id).await,
            Self::Ephemeral(mem) => mem.delete(id).await,
        }
    }

    /// Releases backend connections. No-op for the ephemeral store.
    pub async fn close(&self) {
        if let Self::Persistent(db) = self {
            db.close().await;
        }
    }
}
