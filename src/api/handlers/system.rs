//! System endpoints: liveness.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::cache::CacheMode;
use crate::persistence::StoreMode;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    store: StoreMode,
    cache: CacheMode,
    version: String,
}

/// `GET /health` — Liveness. Reports the backend modes chosen at startup
/// without touching either backend.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns ok plus the store and cache modes decided at startup.",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let policy = state.item_service.policy();
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            store: policy.store,
            cache: policy.cache,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// System routes mounted at the root level (not under /api).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
