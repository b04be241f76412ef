//! Cursor-driven replay engine.

use crate::recorder::Recorder;
use chronicle_core::{CoreError, CoreResult, Timestamp};
use chronicle_log::{decode_value, Action, Cursor, EventLog, LogEntry};

/// Replays a log against the registries of a live session.
///
/// Designed for incremental playback: call
/// [`step_until`](Self::step_until) once per tick with a
/// monotonically increasing target time and the cursor returned by
/// the previous call; each call applies only the entries that
/// became due since the last one.
pub struct Replayer<'a> {
    recorder: &'a Recorder,
}

impl<'a> Replayer<'a> {
    /// Create a replayer over the session whose registries resolve
    /// the log's cids
    #[must_use]
    pub fn new(recorder: &'a Recorder) -> Self {
        Self { recorder }
    }

    /// Apply every entry at or before `target`, starting at
    /// `cursor`, and return the position of the first unapplied
    /// entry.
    ///
    /// Entries with equal timestamps apply in log order. Repeating
    /// a call with the same target and the returned cursor applies
    /// nothing and returns the same cursor. The session is held in
    /// replay mode for the duration of the pass, so attached
    /// recording listeners stay silent.
    ///
    /// # Errors
    ///
    /// Returns `TimeRegression` if `target` precedes an entry the
    /// cursor has already passed, `InvalidReference` for a cid with
    /// no registry slot, and decode errors from malformed change
    /// payloads. The returned cursor is lost on error; restart the
    /// pass from a fresh cursor.
    pub fn step_until(
        &self,
        log: &EventLog,
        target: Timestamp,
        cursor: Cursor,
    ) -> CoreResult<Cursor> {
        let entries = log.entries();
        if cursor.pos() > 0 {
            if let Some(applied) = entries.get(cursor.pos() - 1) {
                if applied.time > target {
                    return Err(CoreError::TimeRegression {
                        last: applied.time,
                        offered: target,
                    });
                }
            }
        }

        let _guard = self.recorder.begin_replay();
        let mut position = cursor.pos();
        while let Some(entry) = entries.get(position) {
            if entry.time > target {
                break;
            }
            self.apply(entry)?;
            position += 1;
        }
        Ok(Cursor::at(position))
    }

    fn apply(&self, entry: &LogEntry) -> CoreResult<()> {
        match &entry.action {
            Action::Change { value: None } => {
                // recorded from a value with no JSON representation
                tracing::warn!(cid = %entry.cid, "change entry has no value; skipping");
            }
            Action::Change { value: Some(text) } => {
                let value = decode_value(text)?;
                if let Some(referenced) = value.as_ref_cid() {
                    // a reference payload must revive through the
                    // registry; a dangling cid fails the whole pass
                    self.recorder.resolve_property(referenced)?;
                }
                let property = self.recorder.resolve_property(entry.cid)?;
                property.set_quiet(value);
                tracing::debug!(cid = %entry.cid, time = %entry.time, "applied change");
            }
            Action::Trigger { event } => {
                let property = self.recorder.resolve_property(entry.cid)?;
                property.fire(event.clone());
                tracing::debug!(cid = %entry.cid, time = %entry.time, "applied trigger");
            }
            Action::Add { collection } => {
                let list = self.recorder.resolve_collection(*collection)?;
                let property = self.recorder.resolve_property(entry.cid)?;
                list.add(property);
            }
            Action::Remove { collection } => {
                let list = self.recorder.resolve_collection(*collection)?;
                let property = self.recorder.resolve_property(entry.cid)?;
                if !list.remove(&property) {
                    tracing::warn!(cid = %entry.cid, collection = %collection,
                        "remove entry for a property that is not a member");
                }
            }
            Action::Reset { collection } => {
                self.recorder.resolve_collection(*collection)?.reset();
            }
            Action::Sort { collection } => {
                self.recorder.resolve_collection(*collection)?.sort();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecorderConfig;
    use crate::recorder::Mode;
    use chronicle_core::{Cid, RegistryKind, Value};
    use chronicle_property::{ObservableList, Property};
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Arc;

    fn recording_session() -> (Recorder, Arc<AtomicU64>) {
        let recorder = Recorder::new(RecorderConfig::new().with_enabled(true));
        let clock = Arc::new(AtomicU64::new(0));
        let clock2 = clock.clone();
        recorder.set_clock(move || Timestamp::from_millis(clock2.load(Ordering::SeqCst)));
        (recorder, clock)
    }

    #[test]
    fn test_incremental_playback_scenario() {
        let (recorder, clock) = recording_session();
        let p = Property::new(Value::Number(1.0));
        recorder.register_property(&p);

        clock.store(10, Ordering::SeqCst);
        p.set(Value::Number(2.0));
        clock.store(20, Ordering::SeqCst);
        p.set(Value::Number(3.0));

        let log = recorder.take_log();
        assert_eq!(log.len(), 2);
        recorder.stop();
        p.set_quiet(Value::Number(1.0)); // rewind state by hand

        let replayer = Replayer::new(&recorder);

        let cursor = replayer
            .step_until(&log, Timestamp::from_millis(15), Cursor::new())
            .unwrap();
        assert_eq!(cursor.pos(), 1);
        assert_eq!(p.get(), Value::Number(2.0));

        let cursor = replayer
            .step_until(&log, Timestamp::from_millis(20), cursor)
            .unwrap();
        assert_eq!(cursor.pos(), 2);
        assert_eq!(p.get(), Value::Number(3.0));
    }

    #[test]
    fn test_step_until_is_idempotent_at_fixed_target() {
        let (recorder, clock) = recording_session();
        let p = Property::new(Value::Number(1.0));
        recorder.register_property(&p);
        clock.store(10, Ordering::SeqCst);
        p.set(Value::Number(2.0));
        let log = recorder.take_log();

        let replayer = Replayer::new(&recorder);
        let target = Timestamp::from_millis(10);
        let cursor = replayer.step_until(&log, target, Cursor::new()).unwrap();
        let again = replayer.step_until(&log, target, cursor).unwrap();
        assert_eq!(cursor, again);
    }

    #[test]
    fn test_same_timestamp_entries_apply_in_log_order() {
        let (recorder, clock) = recording_session();
        let p = Property::new(Value::Number(0.0));
        recorder.register_property(&p);
        clock.store(10, Ordering::SeqCst);
        p.set(Value::Number(1.0));
        p.set(Value::Number(2.0)); // same stamped time
        let log = recorder.take_log();

        p.set_quiet(Value::Number(0.0));
        let replayer = Replayer::new(&recorder);
        let cursor = replayer
            .step_until(&log, Timestamp::from_millis(10), Cursor::new())
            .unwrap();
        assert_eq!(cursor.pos(), 2);
        assert_eq!(p.get(), Value::Number(2.0)); // later entry wins
    }

    #[test]
    fn test_replay_does_not_re_record() {
        let (recorder, clock) = recording_session();
        let p = Property::new(Value::Number(1.0));
        recorder.register_property(&p);
        clock.store(10, Ordering::SeqCst);
        p.set(Value::Number(2.0));
        let log = recorder.take_log();

        // still enabled while replaying
        let replayer = Replayer::new(&recorder);
        replayer
            .step_until(&log, Timestamp::from_millis(10), Cursor::new())
            .unwrap();

        assert!(recorder.log_snapshot().is_empty());
        assert_eq!(recorder.mode(), Mode::Recording); // restored after the pass
    }

    #[test]
    fn test_collection_scenario() {
        let (recorder, clock) = recording_session();
        // ids 0..=3 so the added member sits at cid 3
        let props: Vec<Property> = (0..4).map(|_| Property::new(Value::Null)).collect();
        for p in &props {
            recorder.register_property(p);
        }
        let list = ObservableList::new();
        recorder.register_collection(&list);

        clock.store(5, Ordering::SeqCst);
        list.add(props[3].clone());
        let log = recorder.take_log();

        recorder.stop();
        list.remove(&props[3]); // rewind membership by hand

        let replayer = Replayer::new(&recorder);
        let cursor = replayer
            .step_until(&log, Timestamp::from_millis(5), Cursor::new())
            .unwrap();
        assert_eq!(cursor.pos(), 1);
        assert_eq!(list.len(), 1);
        assert!(list.contains(&props[3]));
    }

    #[test]
    fn test_trigger_replay_fires_listeners() {
        let (recorder, clock) = recording_session();
        let p = Property::new(Value::Null);
        recorder.register_property(&p);
        clock.store(3, Ordering::SeqCst);
        p.fire(serde_json::json!("ping"));
        let log = recorder.take_log();

        let heard = Arc::new(AtomicUsize::new(0));
        let heard2 = heard.clone();
        p.on_trigger(move |_| {
            heard2.fetch_add(1, Ordering::SeqCst);
        });

        let replayer = Replayer::new(&recorder);
        replayer
            .step_until(&log, Timestamp::from_millis(3), Cursor::new())
            .unwrap();
        assert_eq!(heard.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ref_value_revives_to_live_handle() {
        let (recorder, clock) = recording_session();
        let holder = Property::new(Value::Null);
        let target = Property::new(Value::Number(9.0));
        recorder.register_property(&holder);
        let target_cid = recorder.register_property(&target);

        clock.store(10, Ordering::SeqCst);
        holder.set(recorder.ref_to(&target).unwrap());
        let log = recorder.take_log();

        holder.set_quiet(Value::Null);
        let replayer = Replayer::new(&recorder);
        replayer
            .step_until(&log, Timestamp::from_millis(10), Cursor::new())
            .unwrap();

        // the revived reference resolves to the same cell, not a copy
        let revived = holder.get().as_ref_cid().unwrap();
        assert_eq!(revived, target_cid);
        assert!(recorder.resolve_property(revived).unwrap().same_cell(&target));
    }

    #[test]
    fn test_missing_value_is_skipped_not_fatal() {
        let (recorder, _) = recording_session();
        let p = Property::new(Value::Number(1.0));
        recorder.register_property(&p);

        let log = EventLog::from_entries(vec![
            LogEntry::change(Timestamp::from_millis(5), Cid::from_raw(0), None),
            LogEntry::change(
                Timestamp::from_millis(6),
                Cid::from_raw(0),
                Some("2.0".to_string()),
            ),
        ])
        .unwrap();

        let replayer = Replayer::new(&recorder);
        let cursor = replayer
            .step_until(&log, Timestamp::from_millis(10), Cursor::new())
            .unwrap();
        assert_eq!(cursor.pos(), 2); // both consumed, first skipped
        assert_eq!(p.get(), Value::Number(2.0));
    }

    #[test]
    fn test_dangling_ref_payload_fails_fast() {
        let (recorder, _) = recording_session();
        let p = Property::new(Value::Null);
        recorder.register_property(&p); // only cid 0 exists

        let log = EventLog::from_entries(vec![LogEntry::change(
            Timestamp::from_millis(5),
            Cid::from_raw(0),
            Some(r#"{"jsonClass":"Property","cid":99}"#.to_string()),
        )])
        .unwrap();

        let replayer = Replayer::new(&recorder);
        let err = replayer
            .step_until(&log, Timestamp::from_millis(10), Cursor::new())
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidReference {
                kind: RegistryKind::Property,
                cid: Cid::from_raw(99),
            }
        );
        assert_eq!(p.get(), Value::Null); // not assigned
    }

    #[test]
    fn test_unknown_cid_fails_fast() {
        let (recorder, _) = recording_session();
        let log = EventLog::from_entries(vec![LogEntry::change(
            Timestamp::from_millis(5),
            Cid::from_raw(99),
            Some("1.0".to_string()),
        )])
        .unwrap();

        let replayer = Replayer::new(&recorder);
        let err = replayer
            .step_until(&log, Timestamp::from_millis(10), Cursor::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidReference { .. }));
        assert_eq!(recorder.mode(), Mode::Recording); // guard restored on error
    }

    #[test]
    fn test_backward_target_rejected() {
        let (recorder, clock) = recording_session();
        let p = Property::new(Value::Number(1.0));
        recorder.register_property(&p);
        clock.store(20, Ordering::SeqCst);
        p.set(Value::Number(2.0));
        let log = recorder.take_log();

        let replayer = Replayer::new(&recorder);
        let cursor = replayer
            .step_until(&log, Timestamp::from_millis(20), Cursor::new())
            .unwrap();

        let err = replayer
            .step_until(&log, Timestamp::from_millis(10), cursor)
            .unwrap_err();
        assert!(matches!(err, CoreError::TimeRegression { .. }));
    }

    #[test]
    fn test_empty_log_returns_start_cursor() {
        let (recorder, _) = recording_session();
        let replayer = Replayer::new(&recorder);
        let cursor = replayer
            .step_until(&EventLog::new(), Timestamp::from_millis(100), Cursor::new())
            .unwrap();
        assert_eq!(cursor.pos(), 0);
    }
}
