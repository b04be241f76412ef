//! Log entry wire types.
//!
//! The serialized shape is flat JSON: `time`, `type`, `index`, an
//! `action` tag, and the action's own field (`value`, `event`, or
//! `collectionCid`). Field names are part of the wire contract.

use chronicle_core::{Cid, Timestamp};
use serde::{Deserialize, Serialize};

/// Action tags this version understands, in wire form.
///
/// Readers check the tag against this list before deserializing so
/// an unrecognized action surfaces as a reportable error rather
/// than a generic parse failure.
pub const KNOWN_ACTIONS: [&str; 6] = ["change", "trigger", "add", "remove", "reset", "sort"];

/// Category of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// A property-registry entry (the only category in this format)
    #[serde(rename = "property")]
    Property,
}

/// What happened, tagged by `action` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    /// The property's value changed. `value` holds the nested JSON
    /// encoding of the new value; it is absent when the value had
    /// no encoding.
    Change {
        /// Encoded new value, if the value was encodable
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// A trigger fired on the property
    Trigger {
        /// Arbitrary trigger payload
        event: serde_json::Value,
    },
    /// The property was added to a collection
    Add {
        /// Target collection
        #[serde(rename = "collectionCid")]
        collection: Cid,
    },
    /// The property was removed from a collection
    Remove {
        /// Target collection
        #[serde(rename = "collectionCid")]
        collection: Cid,
    },
    /// A collection was reset to its initial membership
    Reset {
        /// Target collection
        #[serde(rename = "collectionCid")]
        collection: Cid,
    },
    /// A collection was re-sorted
    Sort {
        /// Target collection
        #[serde(rename = "collectionCid")]
        collection: Cid,
    },
}

impl Action {
    /// The wire tag for this action
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Change { .. } => "change",
            Self::Trigger { .. } => "trigger",
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Reset { .. } => "reset",
            Self::Sort { .. } => "sort",
        }
    }

    /// The collection this action targets, if any
    #[must_use]
    pub const fn collection(&self) -> Option<Cid> {
        match self {
            Self::Add { collection }
            | Self::Remove { collection }
            | Self::Reset { collection }
            | Self::Sort { collection } => Some(*collection),
            _ => None,
        }
    }
}

/// One timestamped record of an observed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Wall-clock time the operation was observed
    pub time: Timestamp,
    /// Entry category
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Registry id of the property this entry is about. For reset
    /// and sort the collection is the subject, so this repeats the
    /// collection's id.
    #[serde(rename = "index")]
    pub cid: Cid,
    /// What happened
    #[serde(flatten)]
    pub action: Action,
}

impl LogEntry {
    /// A value-change entry
    #[must_use]
    pub fn change(time: Timestamp, cid: Cid, value: Option<String>) -> Self {
        Self {
            time,
            kind: EntryKind::Property,
            cid,
            action: Action::Change { value },
        }
    }

    /// A trigger entry
    #[must_use]
    pub fn trigger(time: Timestamp, cid: Cid, event: serde_json::Value) -> Self {
        Self {
            time,
            kind: EntryKind::Property,
            cid,
            action: Action::Trigger { event },
        }
    }

    /// A collection-add entry
    #[must_use]
    pub fn add(time: Timestamp, cid: Cid, collection: Cid) -> Self {
        Self {
            time,
            kind: EntryKind::Property,
            cid,
            action: Action::Add { collection },
        }
    }

    /// A collection-remove entry
    #[must_use]
    pub fn remove(time: Timestamp, cid: Cid, collection: Cid) -> Self {
        Self {
            time,
            kind: EntryKind::Property,
            cid,
            action: Action::Remove { collection },
        }
    }

    /// A collection-reset entry
    #[must_use]
    pub fn reset(time: Timestamp, collection: Cid) -> Self {
        Self {
            time,
            kind: EntryKind::Property,
            cid: collection,
            action: Action::Reset { collection },
        }
    }

    /// A collection-sort entry
    #[must_use]
    pub fn sort(time: Timestamp, collection: Cid) -> Self {
        Self {
            time,
            kind: EntryKind::Property,
            cid: collection,
            action: Action::Sort { collection },
        }
    }
}
