//! Session-scoped identifiers.
//!
//! A `Cid` is a registry position: 0-based, monotonic, assigned at
//! registration time and never reused or compacted within a session.

use serde::{Deserialize, Serialize};

/// Connection id - identifies a registered property, collection, or
/// property set for the life of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(u32);

impl Cid {
    /// Create from a raw registry position
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw registry position
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Get the raw position as a usize index
    #[must_use]
    pub const fn as_index(&self) -> usize {
        self.0 as usize
    }

    /// The id that follows this one in the same registry
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Cid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cid_{}", self.0)
    }
}

impl From<u32> for Cid {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cid_from_raw() {
        let cid = Cid::from_raw(7);
        assert_eq!(cid.as_u32(), 7);
        assert_eq!(cid.as_index(), 7);
    }

    #[test]
    fn test_cid_next() {
        let cid = Cid::from_raw(0);
        assert_eq!(cid.next(), Cid::from_raw(1));
    }

    #[test]
    fn test_cid_display() {
        let cid = Cid::from_raw(3);
        assert_eq!(format!("{}", cid), "cid_3");
    }

    #[test]
    fn test_cid_ord() {
        assert!(Cid::from_raw(1) < Cid::from_raw(2));
    }

    #[test]
    fn test_cid_serialization_is_bare_integer() {
        let json = serde_json::to_string(&Cid::from_raw(5)).unwrap();
        assert_eq!(json, "5");
        let back: Cid = serde_json::from_str("5").unwrap();
        assert_eq!(back, Cid::from_raw(5));
    }
}
