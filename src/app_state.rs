//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::ItemService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Item service wrapping the store and cache chosen at startup.
    pub item_service: Arc<ItemService>,
}
