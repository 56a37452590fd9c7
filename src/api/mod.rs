//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Item endpoints are mounted under `/api`; liveness and the static
//! front-end live at the root.

pub mod dto;
pub mod handlers;

use std::path::Path;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "item-gateway", description = "Item CRUD with a cache-aside read path"),
    paths(
        handlers::items::create_item,
        handlers::items::list_items,
        handlers::items::get_item,
        handlers::items::update_item,
        handlers::items::delete_item,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Items", description = "Item CRUD"),
        (name = "System", description = "Liveness"),
    )
)]
pub struct ApiDoc;

/// Builds the REST router: `/api/*` plus system routes.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api", handlers::routes())
        .merge(handlers::system::routes())
}

#[cfg(feature = "swagger-ui")]
fn docs() -> Router<AppState> {
    utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(not(feature = "swagger-ui"))]
fn docs() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}

/// Builds the complete application: REST routes, API docs, static
/// front-end, tracing and CORS layers.
pub fn build_app(state: AppState, static_dir: &Path) -> Router {
    let router = build_router().merge(docs());
    handlers::spa::attach(router, static_dir)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
