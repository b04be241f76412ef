//! Core error types for Chronicle.

use crate::{Cid, Timestamp};
use thiserror::Error;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Kind of registry a cid was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    /// Property registry
    Property,
    /// Collection registry
    Collection,
    /// Property-set registry
    Set,
}

impl std::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Property => write!(f, "property"),
            Self::Collection => write!(f, "collection"),
            Self::Set => write!(f, "set"),
        }
    }
}

/// Core error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A log entry names a cid with no slot in the registry.
    /// Fails fast instead of faulting on an out-of-range index.
    #[error("invalid {kind} reference: {cid}")]
    InvalidReference {
        /// Which registry the lookup hit
        kind: RegistryKind,
        /// The offending id
        cid: Cid,
    },

    /// A live handle was offered where a registered one is required
    #[error("handle is not registered as a {kind}")]
    Unregistered {
        /// Which registry was consulted
        kind: RegistryKind,
    },

    /// Unrecognized action tag on a log entry
    #[error("unknown log action: {action:?}")]
    UnknownAction {
        /// The offending action string
        action: String,
    },

    /// An append or replay target moved backward in time
    #[error("time regression: last {last}, offered {offered}")]
    TimeRegression {
        /// Timestamp already committed
        last: Timestamp,
        /// Earlier timestamp that was offered
        offered: Timestamp,
    },

    /// Malformed JSON payload or log entry
    #[error("invalid encoding: {reason}")]
    InvalidEncoding {
        /// What failed to parse
        reason: String,
    },

    /// I/O failure on the persistence path
    #[error("io error: {message}")]
    Io {
        /// Underlying error text
        message: String,
    },
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEncoding {
            reason: err.to_string(),
        }
    }
}
