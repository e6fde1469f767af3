//! Core types for the preference inspector.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_micros() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Key/value pairs of a single store.
pub type PreferenceMap = BTreeMap<String, Value>;

/// How repeated writes to the same key are folded into a store.
///
/// The two policies diverge on purpose: a change-log viewer keeps every
/// value ever written, an editor mirrors the live store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Retain all written values as an append-only list per key.
    Accumulate,
    /// Overwrite the prior value outright.
    Replace,
}

impl Default for WritePolicy {
    fn default() -> Self {
        WritePolicy::Replace
    }
}

/// A single observed mutation (set or delete) to one key in one store.
///
/// Immutable once recorded: events are prepended to an entry's change log
/// and never edited or removed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Which store the change belongs to.
    pub store: String,

    /// The affected preference key.
    pub key: String,

    /// When the instrumented process observed the change.
    pub timestamp: Timestamp,

    /// True for a removal, false for a write.
    pub deleted: bool,

    /// The written value (absent for removals).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ChangeEvent {
    /// A write event stamped with the current time.
    pub fn set(store: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            store: store.into(),
            key: key.into(),
            timestamp: Timestamp::now(),
            deleted: false,
            value: Some(value),
        }
    }

    /// A removal event stamped with the current time.
    pub fn delete(store: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            key: key.into(),
            timestamp: Timestamp::now(),
            deleted: true,
            value: None,
        }
    }
}

/// One store's current preferences plus its chronological change log.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    /// Current key/value view of the store.
    pub preferences: PreferenceMap,

    /// Observed changes, most recent first.
    pub changes: VecDeque<ChangeEvent>,
}

impl PreferenceEntry {
    /// Entry seeded from a snapshot, with an empty change log.
    pub fn from_snapshot(preferences: PreferenceMap) -> Self {
        Self {
            preferences,
            changes: VecDeque::new(),
        }
    }
}

/// The inspector's own view state, saved and restored across sessions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// All observed stores by name.
    pub stores: BTreeMap<String, PreferenceEntry>,

    /// The store the user is looking at.
    pub selected: Option<String>,
}
