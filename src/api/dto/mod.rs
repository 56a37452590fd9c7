//! Data Transfer Objects for REST request serialization.
//!
//! Responses serialize [`crate::domain::Item`] directly; only request
//! bodies need their own shapes.

pub mod item_dto;

pub use item_dto::*;
