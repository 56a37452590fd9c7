//! The `Item` resource, its creation payload and its partial update.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ItemId;
use crate::error::GatewayError;

/// Longest accepted `name`, in characters.
pub const MAX_NAME_LEN: usize = 255;
/// Longest accepted `description`, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 4096;

/// Current time truncated to the microsecond resolution PostgreSQL keeps,
/// so both store backends hand out identical timestamps.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A stored item, exactly as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Item {
    /// Store-assigned identifier.
    #[schema(value_type = i64)]
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Creation timestamp, never changes.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful update.
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for a new item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    /// Display name, non-blank.
    pub name: String,
    /// Free-text description.
    pub description: String,
}

impl NewItem {
    /// Validates and builds a creation payload.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ValidationFailed`] if the name is blank or
    /// either field is too long.
    pub fn new(name: String, description: String) -> Result<Self, GatewayError> {
        validate_name(&name)?;
        validate_description(&description)?;
        Ok(Self { name, description })
    }
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
}

impl ItemPatch {
    /// Validates and builds a patch.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ValidationFailed`] if a supplied name is
    /// blank or a supplied field is too long.
    pub fn new(name: Option<String>, description: Option<String>) -> Result<Self, GatewayError> {
        if let Some(name) = &name {
            validate_name(name)?;
        }
        if let Some(description) = &description {
            validate_description(description)?;
        }
        Ok(Self { name, description })
    }

    /// Applies the patch in place and stamps `updated_at`.
    pub fn apply(self, item: &mut Item, at: DateTime<Utc>) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        item.updated_at = at;
    }
}

fn validate_name(name: &str) -> Result<(), GatewayError> {
    if name.trim().is_empty() {
        return Err(GatewayError::ValidationFailed(
            "name must not be blank".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(GatewayError::ValidationFailed(format!(
            "name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), GatewayError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(GatewayError::ValidationFailed(format!(
            "description exceeds {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}
