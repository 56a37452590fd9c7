//! Item CRUD handlers: create, list, get, update, delete.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CreateItemRequest, UpdateItemRequest, json_rejection};
use crate::app_state::AppState;
use crate::domain::{Item, ItemId};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::ItemRead;

/// Parses a path segment; anything that is not an integer cannot name an
/// item.
fn parse_id(raw: &str) -> Result<ItemId, GatewayError> {
    raw.parse()
        .map_err(|_| GatewayError::NotFound(raw.to_string()))
}

/// `POST /api/items` — Create an item.
///
/// # Errors
///
/// Returns [`GatewayError::ValidationFailed`] on a malformed body.
#[utoipa::path(
    post,
    path = "/api/items",
    tag = "Items",
    summary = "Create an item",
    description = "Stores a new item; the store assigns its id and timestamps.",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Json(req) = payload.map_err(json_rejection)?;
    let item = state.item_service.create(req.into_new_item()?).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /api/items` — List every item.
///
/// # Errors
///
/// Returns [`GatewayError::BackendTransient`] on store failure.
#[utoipa::path(
    get,
    path = "/api/items",
    tag = "Items",
    summary = "List items",
    description = "Returns every item in store order (creation order for the in-memory store).",
    responses(
        (status = 200, description = "All items", body = Vec<Item>),
    )
)]
pub async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.item_service.list().await?))
}

/// `GET /api/items/{id}` — Get one item, served from cache when possible.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if the item does not exist.
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    tag = "Items",
    summary = "Get an item",
    description = "Returns the cached snapshot when one exists, otherwise reads the store and caches the result.",
    params(
        ("id" = i64, Path, description = "Item id"),
    ),
    responses(
        (status = 200, description = "Item", body = Item),
        (status = 404, description = "Item not found", body = ErrorResponse),
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, GatewayError> {
    let id = parse_id(&raw_id)?;
    let response = match state.item_service.get(id).await? {
        ItemRead::Cached(bytes) => {
            ([(header::CONTENT_TYPE, "application/json")], bytes).into_response()
        }
        ItemRead::Stored(item) => Json(item).into_response(),
    };
    Ok(response)
}

/// `PUT /api/items/{id}` — Update an item.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if the item does not exist, checked
/// before the body is looked at, and [`GatewayError::ValidationFailed`] on a
/// malformed body.
#[utoipa::path(
    put,
    path = "/api/items/{id}",
    tag = "Items",
    summary = "Update an item",
    description = "Applies the supplied fields, refreshes updated_at and drops the cached snapshot.",
    params(
        ("id" = i64, Path, description = "Item id"),
    ),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated item", body = Item),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_id(&raw_id)?;
    state.item_service.ensure_exists(id).await?;
    let Json(req) = payload.map_err(json_rejection)?;
    let item = state.item_service.update(id, req.into_patch()?).await?;
    Ok(Json(item))
}

/// `DELETE /api/items/{id}` — Delete an item.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if the item does not exist or was
/// already deleted.
#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    tag = "Items",
    summary = "Delete an item",
    description = "Removes the item and drops its cached snapshot. Deleting twice answers 404.",
    params(
        ("id" = i64, Path, description = "Item id"),
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found", body = ErrorResponse),
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let id = parse_id(&raw_id)?;
    state.item_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Item routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
}
