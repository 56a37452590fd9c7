//! Service layer: business logic orchestration.
//!
//! [`ItemService`] puts the cache-aside read path in front of the item
//! store and invalidates cached snapshots after every mutation.

pub mod item_service;

pub use item_service::{ItemRead, ItemService};
