//! Static front-end: `/assets` from disk, `index.html` for `/` and for
//! every unmatched path.

use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::services::ServeDir;

use crate::app_state::AppState;

async fn index_or(index: PathBuf, status: StatusCode, message: &'static str) -> Response {
    match tokio::fs::read(&index).await {
        Ok(page) => Html(page).into_response(),
        Err(_) => (status, Json(json!({ "message": message }))).into_response(),
    }
}

/// Mounts the asset directory, the root page and the SPA fallback.
pub fn attach(router: Router<AppState>, static_dir: &Path) -> Router<AppState> {
    let index = static_dir.join("index.html");
    let root_index = index.clone();

    router
        .nest_service("/assets", ServeDir::new(static_dir.join("assets")))
        .route(
            "/",
            get(move || index_or(root_index.clone(), StatusCode::OK, "item-gateway")),
        )
        .fallback(move || index_or(index.clone(), StatusCode::NOT_FOUND, "Not found"))
}
