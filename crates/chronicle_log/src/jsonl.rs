//! JSONL persistence: one log entry per line.

use crate::entry::{LogEntry, KNOWN_ACTIONS};
use crate::log::EventLog;
use chronicle_core::{CoreError, CoreResult};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Parse a single JSONL line into a log entry.
///
/// # Errors
///
/// Returns `UnknownAction` with the offending tag when the `action`
/// field is not one this version understands, and `InvalidEncoding`
/// for anything else malformed.
pub fn parse_entry(line: &str) -> CoreResult<LogEntry> {
    let raw: serde_json::Value = serde_json::from_str(line)?;
    let action = raw
        .get("action")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::InvalidEncoding {
            reason: "entry has no action tag".to_string(),
        })?;
    if !KNOWN_ACTIONS.contains(&action) {
        return Err(CoreError::UnknownAction {
            action: action.to_string(),
        });
    }
    Ok(serde_json::from_value(raw)?)
}

/// Streaming writer, one entry per line
pub struct LogWriter<W: Write> {
    writer: W,
}

impl<W: Write> LogWriter<W> {
    /// Create a writer over any sink
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Append one entry as a JSONL line.
    ///
    /// # Errors
    ///
    /// Returns `Io` on write failure.
    pub fn append(&mut self, entry: &LogEntry) -> CoreResult<()> {
        let line = serde_json::to_string(entry)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Flush the underlying sink.
    ///
    /// # Errors
    ///
    /// Returns `Io` on flush failure.
    pub fn flush(&mut self) -> CoreResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Consume and return the inner sink
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Streaming reader, one entry per line. Blank lines are skipped.
pub struct LogReader<R: BufRead> {
    reader: R,
    line: String,
}

impl<R: BufRead> LogReader<R> {
    /// Create a reader over any buffered source
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }

    /// Read the next entry, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Propagates `parse_entry` errors and `Io` on read failure.
    pub fn next_entry(&mut self) -> CoreResult<Option<LogEntry>> {
        loop {
            self.line.clear();
            let n = self.reader.read_line(&mut self.line)?;
            if n == 0 {
                return Ok(None);
            }
            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            return parse_entry(line).map(Some);
        }
    }
}

/// Write a whole log to `path` as JSONL.
///
/// # Errors
///
/// Returns `Io` on file or write failure.
pub fn write_log(path: impl AsRef<Path>, log: &EventLog) -> CoreResult<()> {
    let file = File::create(path)?;
    let mut writer = LogWriter::new(BufWriter::new(file));
    for entry in log.iter() {
        writer.append(entry)?;
    }
    writer.flush()
}

/// Read a whole JSONL log from `path`, validating time ordering.
///
/// # Errors
///
/// Propagates parse errors, `TimeRegression` for out-of-order
/// entries, and `Io` on file failure.
pub fn read_log(path: impl AsRef<Path>) -> CoreResult<EventLog> {
    let file = File::open(path)?;
    let mut reader = LogReader::new(BufReader::new(file));
    let mut log = EventLog::new();
    while let Some(entry) = reader.next_entry()? {
        log.append(entry)?;
    }
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::{Cid, Timestamp};

    fn sample_log() -> EventLog {
        EventLog::from_entries(vec![
            LogEntry::change(
                Timestamp::from_millis(10),
                Cid::from_raw(0),
                Some("2.0".to_string()),
            ),
            LogEntry::add(Timestamp::from_millis(12), Cid::from_raw(1), Cid::from_raw(0)),
            LogEntry::sort(Timestamp::from_millis(15), Cid::from_raw(0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let log = sample_log();

        write_log(&path, &log).unwrap();
        let back = read_log(&path).unwrap();
        assert_eq!(back, log);
    }

    #[test]
    fn test_reader_skips_blank_lines() {
        let input = "\n{\"time\":10,\"type\":\"property\",\"index\":0,\"action\":\"reset\",\"collectionCid\":0}\n\n";
        let mut reader = LogReader::new(input.as_bytes());
        let entry = reader.next_entry().unwrap().unwrap();
        assert_eq!(entry.action.tag(), "reset");
        assert!(reader.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_unknown_action_reported() {
        let line = r#"{"time":10,"type":"property","index":0,"action":"shuffle"}"#;
        let err = parse_entry(line).unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownAction {
                action: "shuffle".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_action_is_invalid_encoding() {
        let line = r#"{"time":10,"type":"property","index":0}"#;
        assert!(matches!(
            parse_entry(line),
            Err(CoreError::InvalidEncoding { .. })
        ));
    }

    #[test]
    fn test_out_of_order_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(
            &path,
            concat!(
                "{\"time\":20,\"type\":\"property\",\"index\":0,\"action\":\"change\",\"value\":\"1.0\"}\n",
                "{\"time\":10,\"type\":\"property\",\"index\":0,\"action\":\"change\",\"value\":\"2.0\"}\n",
            ),
        )
        .unwrap();
        assert!(matches!(
            read_log(&path),
            Err(CoreError::TimeRegression { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = read_log("/nonexistent/session.jsonl");
        assert!(matches!(result, Err(CoreError::Io { .. })));
    }
}
