//! Chronicle Change Log
//!
//! The flat, append-only, time-ordered log a recording session
//! writes and a replay pass consumes: wire-shaped entry types, the
//! paired value encoder/decoder, the forward-only replay cursor,
//! and JSONL persistence.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod cursor;
pub mod entry;
pub mod jsonl;
pub mod log;

pub use codec::{decode_value, encode_value};
pub use cursor::Cursor;
pub use entry::{Action, EntryKind, LogEntry, KNOWN_ACTIONS};
pub use jsonl::{parse_entry, read_log, write_log, LogReader, LogWriter};
pub use log::EventLog;
