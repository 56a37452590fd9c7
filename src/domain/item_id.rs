//! Type-safe item identifier.
//!
//! [`ItemId`] is a newtype over the store-assigned `BIGSERIAL` key so that
//! item identifiers cannot be confused with other integers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier for an item.
///
/// Assigned by the store on creation and immutable thereafter. Always
/// positive; the in-memory store hands them out from 1 upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Wraps a raw store key.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw store key.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    /// Parses a path segment. Non-positive values parse but can never
    /// match a stored item.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for ItemId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_path_segments() {
        assert_eq!("42".parse::<ItemId>().ok(), Some(ItemId::new(42)));
        assert_eq!(" 7 ".parse::<ItemId>().ok(), Some(ItemId::new(7)));
        assert!("abc".parse::<ItemId>().is_err());
        assert!("".parse::<ItemId>().is_err());
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&ItemId::new(3)).ok();
        assert_eq!(json.as_deref(), Some("3"));
    }

    #[test]
    fn orders_numerically() {
        assert!(ItemId::new(2) < ItemId::new(10));
    }
}
