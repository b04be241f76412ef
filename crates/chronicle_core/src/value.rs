//! Payload values carried by properties and log entries.
//!
//! The variant is chosen explicitly by the caller; there is no
//! field-sniffing to decide whether a payload "looks like" a
//! reference. `Ref` and `Vector2` are the only shapes with a typed
//! wire envelope - everything else crosses the wire structurally.

use crate::Cid;
use serde::{Deserialize, Serialize};

/// A 2D vector payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
}

impl Vector2 {
    /// The zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Vector2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A property value.
///
/// `Ref` points at a registered property by its session cid and
/// revives to the live handle on replay, not to a copy. `Json` is
/// the structural pass-through for arbitrary composite data.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value
    Null,
    /// Boolean
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
    /// 2D vector, wire-encoded with a typed envelope
    Vector2(Vector2),
    /// Reference to a registered property
    Ref(Cid),
    /// Arbitrary structural data, passed through as-is
    Json(serde_json::Value),
}

impl Value {
    /// True if this value is a reference to a registered property
    #[must_use]
    pub const fn is_ref(&self) -> bool {
        matches!(self, Self::Ref(_))
    }

    /// The referenced cid, if this value is a reference
    #[must_use]
    pub const fn as_ref_cid(&self) -> Option<Cid> {
        match self {
            Self::Ref(cid) => Some(*cid),
            _ => None,
        }
    }

    /// The numeric payload, if any
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vector2> for Value {
    fn from(value: Vector2) -> Self {
        Self::Vector2(value)
    }
}
