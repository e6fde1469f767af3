//! Change-event application.
//!
//! The reducer is the single funnel for store mutations: live events from
//! the change feed and mirrored device responses both land here, so a
//! duplicate delivery degrades to a redundant overwrite (replace policy)
//! or a repeated list entry (accumulate policy), never an error.

use crate::types::{ChangeEvent, PreferenceEntry, PreferenceMap, WritePolicy};
use serde_json::Value;
use std::collections::BTreeMap;

/// What happened to an applied change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// The event was folded into the store map.
    Applied,
    /// The event named a store the map has never seen and was dropped
    /// (replace policy only).
    UnknownStore,
}

/// Fold one change event into the store map.
///
/// The event is prepended to the entry's change log regardless of kind.
/// Under [`WritePolicy::Accumulate`] an unknown store is created empty
/// first; under [`WritePolicy::Replace`] the event is dropped outright.
pub fn apply_change(
    stores: &mut BTreeMap<String, PreferenceEntry>,
    change: ChangeEvent,
    policy: WritePolicy,
) -> ChangeOutcome {
    let entry = match policy {
        WritePolicy::Accumulate => stores.entry(change.store.clone()).or_default(),
        WritePolicy::Replace => match stores.get_mut(&change.store) {
            Some(entry) => entry,
            None => return ChangeOutcome::UnknownStore,
        },
    };

    if change.deleted {
        entry.preferences.remove(&change.key);
    } else {
        let value = change.value.clone().unwrap_or(Value::Null);
        match policy {
            WritePolicy::Accumulate => accumulate(&mut entry.preferences, &change.key, value),
            WritePolicy::Replace => {
                entry.preferences.insert(change.key.clone(), value);
            }
        }
    }

    entry.changes.push_front(change);
    ChangeOutcome::Applied
}

/// Append a value to the list at `key`, creating the list if absent.
///
/// A non-list slot (possible after a snapshot load) is reseeded as a
/// one-element list of the prior value. A list value contributes its
/// elements individually; anything else contributes itself.
fn accumulate(preferences: &mut PreferenceMap, key: &str, value: Value) {
    let slot = preferences
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        *slot = Value::Array(vec![slot.take()]);
    }
    if let Value::Array(items) = slot {
        match value {
            Value::Array(values) => items.extend(values),
            other => items.push(other),
        }
    }
}

/// Fold a full store snapshot into the store map.
///
/// Replaces the entry's preferences wholesale and preserves its change
/// log: a snapshot is not a change event and never touches history.
pub fn fold_snapshot(
    stores: &mut BTreeMap<String, PreferenceEntry>,
    store: impl Into<String>,
    preferences: PreferenceMap,
) {
    stores.entry(store.into()).or_default().preferences = preferences;
}
