//! Chronicle Core Types
//!
//! This crate contains pure types and logic with no I/O.
//! All types serialize to the JSON wire shapes used by the log.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod time;
pub mod value;

// Re-exports
pub use error::{CoreError, CoreResult, RegistryKind};
pub use id::Cid;
pub use time::Timestamp;
pub use value::{Value, Vector2};
