//! Chronicle Recording Session and Replay Engine
//!
//! A [`Recorder`] owns a session: three parallel registries
//! (properties, collections, property sets) indexed by monotonic
//! cids, the append-only change log, and the session flags. A
//! [`Replayer`] walks a log with a forward-only cursor, re-applying
//! entries up to a target time to reconstruct state.
//!
//! The session object is constructed and owned by the host
//! application and passed by reference - there is no process-wide
//! singleton.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod recorder;

pub use config::RecorderConfig;
pub use engine::Replayer;
pub use recorder::{Mode, Recorder};
