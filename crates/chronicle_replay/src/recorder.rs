//! The recording session object.

use crate::config::RecorderConfig;
use chronicle_core::{Cid, CoreError, CoreResult, RegistryKind, Timestamp, Value};
use chronicle_log::{encode_value, EventLog, LogEntry};
use chronicle_property::{ListEvent, ListenerId, ObservableList, Property, PropertySet};
use std::sync::{Arc, Mutex};

/// What the session is currently doing.
///
/// Listener callbacks append only in `Recording`; replay runs in
/// `Replaying`, so reconstructed operations are never re-recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Attached but not capturing
    Idle,
    /// Capturing observed operations into the log
    Recording,
    /// Re-applying a log; captures are suppressed
    Replaying,
}

type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

enum Attachment {
    Property {
        property: Property,
        change: ListenerId,
        trigger: ListenerId,
    },
    Collection {
        list: ObservableList,
        listener: ListenerId,
    },
}

struct State {
    enabled: bool,
    mode: Mode,
    clock: Clock,
    properties: Vec<Property>,
    collections: Vec<ObservableList>,
    sets: Vec<(String, PropertySet)>,
    log: EventLog,
    attached: Vec<Attachment>,
}

struct Shared {
    state: Mutex<State>,
}

impl Shared {
    fn record_change(&self, cid: Cid, new: &Value) {
        let mut state = self.state.lock().expect("lock poisoned");
        if !(state.enabled && state.mode == Mode::Recording) {
            return;
        }
        let time = (state.clock)();
        let entry = LogEntry::change(time, cid, encode_value(new));
        if let Err(err) = state.log.append(entry) {
            tracing::debug!(error = %err, %cid, "failed to append change entry");
        }
    }

    fn record_trigger(&self, cid: Cid, event: &serde_json::Value) {
        let mut state = self.state.lock().expect("lock poisoned");
        if !(state.enabled && state.mode == Mode::Recording) {
            return;
        }
        let time = (state.clock)();
        let entry = LogEntry::trigger(time, cid, event.clone());
        if let Err(err) = state.log.append(entry) {
            tracing::debug!(error = %err, %cid, "failed to append trigger entry");
        }
    }

    fn record_list_event(&self, collection: Cid, event: &ListEvent) {
        let mut state = self.state.lock().expect("lock poisoned");
        if !(state.enabled && state.mode == Mode::Recording) {
            return;
        }
        let time = (state.clock)();
        let entry = match event {
            ListEvent::Added(property) => {
                let Some(cid) = member_cid(&state, property) else {
                    tracing::warn!(%collection, "added property is not registered; skipping");
                    return;
                };
                LogEntry::add(time, cid, collection)
            }
            ListEvent::Removed(property) => {
                let Some(cid) = member_cid(&state, property) else {
                    tracing::warn!(%collection, "removed property is not registered; skipping");
                    return;
                };
                LogEntry::remove(time, cid, collection)
            }
            ListEvent::Reset => LogEntry::reset(time, collection),
            ListEvent::Sorted => LogEntry::sort(time, collection),
        };
        if let Err(err) = state.log.append(entry) {
            tracing::debug!(error = %err, %collection, "failed to append collection entry");
        }
    }
}

fn member_cid(state: &State, property: &Property) -> Option<Cid> {
    state
        .properties
        .iter()
        .position(|p| p.same_cell(property))
        .map(|index| Cid::from_raw(index as u32))
}

/// A recording session.
///
/// Holds three parallel registries indexed by monotonically
/// assigned cids, plus the flat entry log. Registration subscribes
/// lazily: the value a property holds at registration time is never
/// captured, only subsequent changes are.
pub struct Recorder {
    shared: Arc<Shared>,
}

impl Recorder {
    /// Create a session with the given configuration
    #[must_use]
    pub fn new(config: RecorderConfig) -> Self {
        let mode = if config.enabled {
            Mode::Recording
        } else {
            Mode::Idle
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    enabled: config.enabled,
                    mode,
                    clock: Arc::new(Timestamp::now),
                    properties: Vec::new(),
                    collections: Vec::new(),
                    sets: Vec::new(),
                    log: EventLog::new(),
                    attached: Vec::new(),
                }),
            }),
        }
    }

    /// Replace the wall clock used to stamp entries. Tests drive
    /// this with a manual clock.
    pub fn set_clock<F>(&self, clock: F)
    where
        F: Fn() -> Timestamp + Send + Sync + 'static,
    {
        self.shared.state.lock().expect("lock poisoned").clock = Arc::new(clock);
    }

    /// Register a property, assign it the next cid, and subscribe
    /// change and trigger listeners. Lazy link: nothing is recorded
    /// for the value the property currently holds.
    ///
    /// The cid is assigned even when recording is disabled, so ids
    /// agree with an enabled run of the same registration order.
    pub fn register_property(&self, property: &Property) -> Cid {
        let cid = {
            let mut state = self.shared.state.lock().expect("lock poisoned");
            let cid = Cid::from_raw(state.properties.len() as u32);
            state.properties.push(property.clone());
            cid
        };

        let weak = Arc::downgrade(&self.shared);
        let change = property.on_change(move |new, _old| {
            if let Some(shared) = weak.upgrade() {
                shared.record_change(cid, new);
            }
        });
        let weak = Arc::downgrade(&self.shared);
        let trigger = property.on_trigger(move |event| {
            if let Some(shared) = weak.upgrade() {
                shared.record_trigger(cid, event);
            }
        });

        let mut state = self.shared.state.lock().expect("lock poisoned");
        state.attached.push(Attachment::Property {
            property: property.clone(),
            change,
            trigger,
        });
        cid
    }

    /// Register a collection and subscribe to its structural events
    pub fn register_collection(&self, list: &ObservableList) -> Cid {
        let cid = {
            let mut state = self.shared.state.lock().expect("lock poisoned");
            let cid = Cid::from_raw(state.collections.len() as u32);
            state.collections.push(list.clone());
            cid
        };

        let weak = Arc::downgrade(&self.shared);
        let listener = list.on_event(move |event| {
            if let Some(shared) = weak.upgrade() {
                shared.record_list_event(cid, event);
            }
        });

        let mut state = self.shared.state.lock().expect("lock poisoned");
        state.attached.push(Attachment::Collection {
            list: list.clone(),
            listener,
        });
        cid
    }

    /// Register a named property set. Registry growth only - no
    /// replayable operation addresses sets.
    pub fn register_set(&self, name: impl Into<String>, set: &PropertySet) -> Cid {
        let mut state = self.shared.state.lock().expect("lock poisoned");
        let cid = Cid::from_raw(state.sets.len() as u32);
        state.sets.push((name.into(), set.clone()));
        cid
    }

    /// Resolve a live handle to a reference value for storing one
    /// property inside another.
    ///
    /// # Errors
    ///
    /// Returns `Unregistered` if the handle was never registered.
    pub fn ref_to(&self, property: &Property) -> CoreResult<Value> {
        let state = self.shared.state.lock().expect("lock poisoned");
        member_cid(&state, property)
            .map(Value::Ref)
            .ok_or(CoreError::Unregistered {
                kind: RegistryKind::Property,
            })
    }

    /// Look up the live property registered under `cid`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` for an unassigned cid.
    pub fn resolve_property(&self, cid: Cid) -> CoreResult<Property> {
        let state = self.shared.state.lock().expect("lock poisoned");
        state
            .properties
            .get(cid.as_index())
            .cloned()
            .ok_or(CoreError::InvalidReference {
                kind: RegistryKind::Property,
                cid,
            })
    }

    /// Look up the live collection registered under `cid`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` for an unassigned cid.
    pub fn resolve_collection(&self, cid: Cid) -> CoreResult<ObservableList> {
        let state = self.shared.state.lock().expect("lock poisoned");
        state
            .collections
            .get(cid.as_index())
            .cloned()
            .ok_or(CoreError::InvalidReference {
                kind: RegistryKind::Collection,
                cid,
            })
    }

    /// Enable recording
    pub fn start(&self) {
        let mut state = self.shared.state.lock().expect("lock poisoned");
        state.enabled = true;
        if state.mode == Mode::Idle {
            state.mode = Mode::Recording;
        }
    }

    /// Disable recording
    pub fn stop(&self) {
        let mut state = self.shared.state.lock().expect("lock poisoned");
        state.enabled = false;
        if state.mode == Mode::Recording {
            state.mode = Mode::Idle;
        }
    }

    /// Whether listeners currently append to the log
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.shared.state.lock().expect("lock poisoned").enabled
    }

    /// Current session mode
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.shared.state.lock().expect("lock poisoned").mode
    }

    /// Copy of the session log
    #[must_use]
    pub fn log_snapshot(&self) -> EventLog {
        self.shared.state.lock().expect("lock poisoned").log.clone()
    }

    /// Take the session log, leaving an empty one behind
    #[must_use]
    pub fn take_log(&self) -> EventLog {
        let mut state = self.shared.state.lock().expect("lock poisoned");
        std::mem::take(&mut state.log)
    }

    /// Number of registered properties
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.shared.state.lock().expect("lock poisoned").properties.len()
    }

    /// Number of registered collections
    #[must_use]
    pub fn collection_count(&self) -> usize {
        self.shared.state.lock().expect("lock poisoned").collections.len()
    }

    /// Number of registered property sets
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.shared.state.lock().expect("lock poisoned").sets.len()
    }

    /// Reset the session: empty all three registries and the log,
    /// and detach every listener this recorder attached. Externally
    /// owned properties keep working; they just stop being observed.
    pub fn clear(&self) {
        // Listeners lock the state while holding the observed cell's
        // listener lock, so detaching must not hold the state lock.
        let attached = {
            let mut state = self.shared.state.lock().expect("lock poisoned");
            state.properties.clear();
            state.collections.clear();
            state.sets.clear();
            std::mem::take(&mut state.attached)
        };
        for attachment in attached {
            match attachment {
                Attachment::Property {
                    property,
                    change,
                    trigger,
                } => {
                    property.remove_listener(change);
                    property.remove_listener(trigger);
                }
                Attachment::Collection { list, listener } => {
                    list.remove_listener(listener);
                }
            }
        }
        // Entries captured while listeners were still detaching
        // belong to the old session; wipe them last.
        self.shared.state.lock().expect("lock poisoned").log.clear();
    }

    /// Enter replay mode until the returned guard drops
    pub(crate) fn begin_replay(&self) -> ReplayGuard {
        let mut state = self.shared.state.lock().expect("lock poisoned");
        let previous = state.mode;
        state.mode = Mode::Replaying;
        ReplayGuard {
            shared: self.shared.clone(),
            previous,
        }
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock().expect("lock poisoned");
        f.debug_struct("Recorder")
            .field("enabled", &state.enabled)
            .field("mode", &state.mode)
            .field("properties", &state.properties.len())
            .field("collections", &state.collections.len())
            .field("sets", &state.sets.len())
            .field("log_len", &state.log.len())
            .finish()
    }
}

/// Restores the previous mode when a replay pass ends, including on
/// the error path.
pub(crate) struct ReplayGuard {
    shared: Arc<Shared>,
    previous: Mode,
}

impl Drop for ReplayGuard {
    fn drop(&mut self) {
        self.shared.state.lock().expect("lock poisoned").mode = self.previous;
    }
}
