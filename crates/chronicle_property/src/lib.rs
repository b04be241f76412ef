//! Chronicle Observable Capability
//!
//! The value cells and collections a recording session observes:
//! change-notifying properties with lazy-link subscription, ordered
//! observable lists, and named property sets. Handles are cheap
//! clones of a shared cell; equality is cell identity.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod list;
pub mod property;
pub mod set;

pub use list::{Comparator, ListEvent, ObservableList};
pub use property::{ListenerId, Property};
pub use set::PropertySet;
