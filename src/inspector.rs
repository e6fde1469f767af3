//! The inspector container tying all components together.

use crate::client::{DeletePreferenceRequest, DeviceClient, SetPreferenceRequest};
use crate::error::{InspectorError, Result};
use crate::feed::ChangeFeed;
use crate::host::{FileExchange, Notifier, NullNotifier, SessionStore};
use crate::json::{self, TreeEdit};
use crate::reducer::{apply_change, fold_snapshot, ChangeOutcome};
use crate::types::{ChangeEvent, PersistedSession, PreferenceEntry, PreferenceMap, WritePolicy};
use parking_lot::RwLock;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Inspector configuration.
#[derive(Clone, Debug)]
pub struct InspectorConfig {
    /// How repeated writes to the same key are folded in.
    pub policy: WritePolicy,

    /// Replay imported keys against the device as individual set
    /// commands.
    pub replay_imports: bool,
}

impl InspectorConfig {
    /// Read-only change-log viewer: every written value is retained,
    /// imports only touch the local view.
    pub fn viewer() -> Self {
        Self {
            policy: WritePolicy::Accumulate,
            replay_imports: false,
        }
    }

    /// Live editor: the view mirrors the device's store, and imports are
    /// replayed so the process converges to the imported snapshot.
    pub fn editor() -> Self {
        Self {
            policy: WritePolicy::Replace,
            replay_imports: true,
        }
    }
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self::editor()
    }
}

/// Live view of an instrumented application's preference stores.
///
/// Holds the store map and the selected store name behind one lock; the
/// snapshot loader, the event pump, and the mutation commands all funnel
/// through it, so state transitions apply one at a time.
pub struct Inspector {
    config: InspectorConfig,
    client: Arc<dyn DeviceClient>,
    exchange: Option<Arc<dyn FileExchange>>,
    notifier: Arc<dyn Notifier>,
    sessions: Option<Arc<dyn SessionStore>>,
    state: RwLock<PersistedSession>,
}

impl Inspector {
    /// Create an inspector over the given device client.
    ///
    /// File exchange and session persistence are absent until injected;
    /// notifications go nowhere by default.
    pub fn new(config: InspectorConfig, client: Arc<dyn DeviceClient>) -> Self {
        Self {
            config,
            client,
            exchange: None,
            notifier: Arc::new(NullNotifier),
            sessions: None,
            state: RwLock::new(PersistedSession::default()),
        }
    }

    /// Inject the host's file save/open capability.
    pub fn with_file_exchange(mut self, exchange: Arc<dyn FileExchange>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// Inject the host's notification surface.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Inject the host's persistence slot for view state.
    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    // --- Connection ---

    /// Fetch a full snapshot of every store and fold it in.
    ///
    /// Called once the instrumented process is reachable; safe to call
    /// again on reconnect, since snapshots never touch change history.
    pub fn connect(&self) -> Result<()> {
        let snapshots = self.client.fetch_all()?;
        debug!(stores = snapshots.len(), "Loaded store snapshots");

        let mut state = self.state.write();
        for (name, preferences) in snapshots {
            Self::update_preferences(&mut state, name, preferences);
        }
        Ok(())
    }

    /// Shared entry-creation path: replace a store's preferences
    /// wholesale, keep its history, select it if nothing is selected yet.
    fn update_preferences(state: &mut PersistedSession, name: String, preferences: PreferenceMap) {
        if state.selected.is_none() {
            state.selected = Some(name.clone());
        }
        fold_snapshot(&mut state.stores, name, preferences);
    }

    // --- Change Events ---

    /// Apply one live change event through the reducer.
    pub fn handle_change(&self, change: ChangeEvent) {
        let store = change.store.clone();
        let mut state = self.state.write();
        match apply_change(&mut state.stores, change, self.config.policy) {
            ChangeOutcome::Applied => {}
            ChangeOutcome::UnknownStore => {
                debug!(store = %store, "Dropped change event for unknown store");
            }
        }
    }

    /// Drain every buffered event from the feed, applying each in
    /// arrival order. Returns how many were applied.
    pub fn pump(&self, feed: &ChangeFeed) -> usize {
        let mut applied = 0;
        while let Some(change) = feed.try_next() {
            self.handle_change(change);
            applied += 1;
        }
        applied
    }

    // --- Mutation Commands ---

    /// Write one preference on the device and mirror its response.
    ///
    /// On failure the local view is left untouched.
    pub fn set_preference(
        &self,
        store: impl Into<String>,
        key: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        let request = SetPreferenceRequest {
            store_name: store.into(),
            preference_name: key.into(),
            preference_value: value,
        };
        let updated = self.client.set_preference(&request)?;
        debug!(store = %request.store_name, key = %request.preference_name, "Set preference");

        let mut state = self.state.write();
        Self::update_preferences(&mut state, request.store_name, updated);
        Ok(())
    }

    /// Remove one preference on the device and mirror its response.
    pub fn delete_preference(&self, store: impl Into<String>, key: impl Into<String>) -> Result<()> {
        let request = DeletePreferenceRequest {
            store_name: store.into(),
            preference_name: key.into(),
        };
        let updated = self.client.delete_preference(&request)?;
        debug!(store = %request.store_name, key = %request.preference_name, "Deleted preference");

        let mut state = self.state.write();
        Self::update_preferences(&mut state, request.store_name, updated);
        Ok(())
    }

    // --- Tree-Widget Edits ---

    /// Apply an edit reported by the JSON tree widget.
    ///
    /// The device API works on whole top-level keys regardless of edit
    /// depth: the key at the path root is re-set to its value extracted
    /// from the edited tree. An edit at the tree root itself is a no-op.
    pub fn apply_tree_edit(&self, edit: &TreeEdit) -> Result<()> {
        let path = edit.path();
        let root = match path.first() {
            Some(segment) => segment,
            None => return Ok(()),
        };
        let key = root.as_key().ok_or_else(|| {
            InspectorError::InvalidPath("edit path must start with an object key".to_string())
        })?;
        let selected = self.selected().ok_or(InspectorError::NoStoreSelected)?;

        let value = json::extract(&edit.edited_tree, &path[..1])
            .cloned()
            .ok_or_else(|| {
                InspectorError::InvalidPath(format!("key {key:?} missing from edited tree"))
            })?;
        self.set_preference(selected, key, value)
    }

    /// Apply a delete reported by the JSON tree widget.
    ///
    /// Depth one removes the key itself; a deeper delete folds into a
    /// re-set of the top-level key from the edited tree.
    pub fn apply_tree_delete(&self, edit: &TreeEdit) -> Result<()> {
        let path = edit.path();
        let root = match path.first() {
            Some(segment) => segment,
            None => return Ok(()),
        };
        let key = root.as_key().ok_or_else(|| {
            InspectorError::InvalidPath("delete path must start with an object key".to_string())
        })?;
        let selected = self.selected().ok_or(InspectorError::NoStoreSelected)?;

        if path.len() == 1 {
            self.delete_preference(selected, key)
        } else {
            let value = json::extract(&edit.edited_tree, &path[..1])
                .cloned()
                .ok_or_else(|| {
                    InspectorError::InvalidPath(format!("key {key:?} missing from edited tree"))
                })?;
            self.set_preference(selected, key, value)
        }
    }

    // --- File Export / Import ---

    /// Serialize the selected entry and hand it to the file exchange.
    ///
    /// A save failure is surfaced as a user notification and otherwise
    /// swallowed; `Ok(None)` covers both "nothing selected" and a failed
    /// save.
    pub fn export_selected(&self) -> Result<Option<PathBuf>> {
        let exchange = self
            .exchange
            .as_ref()
            .ok_or(InspectorError::CapabilityMissing("file exchange"))?;

        let (name, entry) = {
            let state = self.state.read();
            let name = match &state.selected {
                Some(name) => name.clone(),
                None => return Ok(None),
            };
            match state.stores.get(&name) {
                Some(entry) => (name, entry.clone()),
                None => return Ok(None),
            }
        };

        let serialized = serde_json::to_string(&entry)?;
        match exchange.export_file(&name, &serialized) {
            Ok(path) => Ok(Some(path)),
            Err(error) => {
                warn!(store = %name, %error, "Export failed");
                self.notifier.notify_error(
                    "Save failed",
                    &format!("Could not save preferences for {name} to file"),
                );
                Ok(None)
            }
        }
    }

    /// Read a snapshot file and apply its preference map to the selected
    /// store.
    ///
    /// A cancelled pick or missing selection is a no-op. Parse faults
    /// propagate. With import replay enabled, every imported key is
    /// re-sent to the device as an individual set command, sequentially
    /// and at-least-once; a failure partway propagates and leaves the
    /// device in a mixed state.
    pub fn import_selected(&self) -> Result<()> {
        let exchange = self
            .exchange
            .as_ref()
            .ok_or(InspectorError::CapabilityMissing("file exchange"))?;

        let file = match exchange.import_file()? {
            Some(file) => file,
            None => return Ok(()),
        };
        let imported: PreferenceEntry = serde_json::from_str(&file.contents)
            .map_err(|e| InspectorError::Deserialization(e.to_string()))?;

        let name = match self.selected() {
            Some(name) => name,
            None => return Ok(()),
        };

        {
            let mut state = self.state.write();
            Self::update_preferences(&mut state, name.clone(), imported.preferences.clone());
        }
        debug!(
            store = %name,
            keys = imported.preferences.len(),
            path = %file.path.display(),
            "Imported preferences"
        );

        if self.config.replay_imports {
            // Replies are ignored: the imported map is already applied
            // locally, and the device's own event stream carries the rest.
            for (key, value) in imported.preferences {
                self.client.set_preference(&SetPreferenceRequest {
                    store_name: name.clone(),
                    preference_name: key,
                    preference_value: value,
                })?;
            }
        }
        Ok(())
    }

    // --- Selection & Accessors ---

    /// Point the selection at a known store.
    pub fn select_store(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let mut state = self.state.write();
        if !state.stores.contains_key(&name) {
            return Err(InspectorError::StoreNotFound(name));
        }
        state.selected = Some(name);
        Ok(())
    }

    /// The selected store name, if any.
    pub fn selected(&self) -> Option<String> {
        self.state.read().selected.clone()
    }

    /// Store names, case-insensitively sorted for display.
    pub fn store_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().stores.keys().cloned().collect();
        names.sort_by_key(|name| name.to_lowercase());
        names
    }

    /// A store's entry by name.
    pub fn entry(&self, name: &str) -> Option<PreferenceEntry> {
        self.state.read().stores.get(name).cloned()
    }

    /// The selected store's entry.
    pub fn selected_entry(&self) -> Option<PreferenceEntry> {
        let state = self.state.read();
        let name = state.selected.as_ref()?;
        state.stores.get(name).cloned()
    }

    // --- Session Persistence ---

    /// Persist the current view state through the session store.
    pub fn save_session(&self) -> Result<()> {
        let sessions = self
            .sessions
            .as_ref()
            .ok_or(InspectorError::CapabilityMissing("session store"))?;
        let serialized = serde_json::to_string(&*self.state.read())?;
        sessions.save(&serialized)
    }

    /// Restore a previously saved view state, replacing the current one.
    /// Returns whether anything was restored.
    pub fn restore_session(&self) -> Result<bool> {
        let sessions = self
            .sessions
            .as_ref()
            .ok_or(InspectorError::CapabilityMissing("session store"))?;
        let serialized = match sessions.load()? {
            Some(serialized) => serialized,
            None => return Ok(false),
        };
        let restored: PersistedSession = serde_json::from_str(&serialized)
            .map_err(|e| InspectorError::Deserialization(e.to_string()))?;
        *self.state.write() = restored;
        Ok(true)
    }
}
