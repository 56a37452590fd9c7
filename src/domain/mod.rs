//! Domain layer: the managed `Item` resource and its identifier.

pub mod item;
pub mod item_id;

pub use item::{Item, ItemPatch, NewItem, now};
pub use item_id::ItemId;
