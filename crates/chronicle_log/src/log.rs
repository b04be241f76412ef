//! Append-only, time-ordered entry log.

use crate::entry::LogEntry;
use chronicle_core::{CoreError, CoreResult, Timestamp};

/// The flat log a recording session appends to and a replay pass
/// consumes.
///
/// Appends must not move backward in time; entries with equal
/// timestamps keep insertion order. Entries are never mutated or
/// compacted - `clear` starts a new session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a log from already-ordered entries.
    ///
    /// # Errors
    ///
    /// Returns `TimeRegression` at the first out-of-order pair.
    pub fn from_entries(entries: Vec<LogEntry>) -> CoreResult<Self> {
        let mut log = Self::new();
        for entry in entries {
            log.append(entry)?;
        }
        Ok(log)
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns `TimeRegression` if `entry.time` precedes the tail.
    pub fn append(&mut self, entry: LogEntry) -> CoreResult<()> {
        if let Some(last) = self.last_time() {
            if entry.time < last {
                return Err(CoreError::TimeRegression {
                    last,
                    offered: entry.time,
                });
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    /// All entries, in append order
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Timestamp of the tail entry
    #[must_use]
    pub fn last_time(&self) -> Option<Timestamp> {
        self.entries.last().map(|e| e.time)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the log has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, starting a fresh session
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate entries in append order
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}
