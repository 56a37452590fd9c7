//! Request bodies for the item endpoints.

use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{ItemPatch, NewItem};
use crate::error::GatewayError;

/// `POST /api/items` body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    /// Display name; must not be blank.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

impl CreateItemRequest {
    /// Validates the body.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ValidationFailed`] on invalid fields.
    pub fn into_new_item(self) -> Result<NewItem, GatewayError> {
        NewItem::new(self.name, self.description)
    }
}

/// `PUT /api/items/{id}` body. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    /// Replacement display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
}

impl UpdateItemRequest {
    /// Validates the body.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ValidationFailed`] on invalid fields.
    pub fn into_patch(self) -> Result<ItemPatch, GatewayError> {
        ItemPatch::new(self.name, self.description)
    }
}

/// Turns axum's JSON extraction failure into a 400.
#[must_use]
pub fn json_rejection(rejection: JsonRejection) -> GatewayError {
    GatewayError::ValidationFailed(rejection.body_text())
}
