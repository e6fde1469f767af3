//! Request/response surface to the instrumented process.

use crate::error::{InspectorError, Result};
use crate::feed::ChangePublisher;
use crate::types::{ChangeEvent, PreferenceMap};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parameters for writing a single preference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPreferenceRequest {
    pub store_name: String,
    pub preference_name: String,
    pub preference_value: Value,
}

/// Parameters for removing a single preference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePreferenceRequest {
    pub store_name: String,
    pub preference_name: String,
}

/// RPC surface to the instrumented process.
///
/// Mutation calls answer with the entire updated preference map for the
/// store. The process may additionally emit a change event for the same
/// mutation through the live feed; both paths funnel into the same
/// reducer on the inspector side.
pub trait DeviceClient {
    /// Full snapshot of every store.
    fn fetch_all(&self) -> Result<BTreeMap<String, PreferenceMap>>;

    /// Write one preference. Returns the store's full updated map.
    fn set_preference(&self, request: &SetPreferenceRequest) -> Result<PreferenceMap>;

    /// Remove one preference. Returns the store's full updated map.
    fn delete_preference(&self, request: &DeletePreferenceRequest) -> Result<PreferenceMap>;
}

/// An in-process stand-in for an instrumented application.
///
/// Answers requests from its own store map and mirrors every mutation
/// into an attached publisher, reproducing the dual-path delivery of a
/// real process: the direct response and the asynchronous change event.
pub struct InMemoryDevice {
    stores: RwLock<BTreeMap<String, PreferenceMap>>,
    publisher: RwLock<Option<ChangePublisher>>,
}

impl InMemoryDevice {
    pub fn new() -> Self {
        Self {
            stores: RwLock::new(BTreeMap::new()),
            publisher: RwLock::new(None),
        }
    }

    /// Seed a store (builder-style).
    pub fn with_store(self, name: impl Into<String>, preferences: PreferenceMap) -> Self {
        self.stores.write().insert(name.into(), preferences);
        self
    }

    /// Mirror subsequent mutations into `publisher` as change events.
    pub fn attach_publisher(&self, publisher: ChangePublisher) {
        *self.publisher.write() = Some(publisher);
    }

    /// Best-effort event emission; a full or disconnected feed drops it.
    fn emit(&self, event: ChangeEvent) {
        if let Some(publisher) = self.publisher.read().as_ref() {
            publisher.publish(event);
        }
    }
}

impl Default for InMemoryDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceClient for InMemoryDevice {
    fn fetch_all(&self) -> Result<BTreeMap<String, PreferenceMap>> {
        Ok(self.stores.read().clone())
    }

    fn set_preference(&self, request: &SetPreferenceRequest) -> Result<PreferenceMap> {
        let updated = {
            let mut stores = self.stores.write();
            let store = stores.entry(request.store_name.clone()).or_default();
            store.insert(
                request.preference_name.clone(),
                request.preference_value.clone(),
            );
            store.clone()
        };

        self.emit(ChangeEvent::set(
            request.store_name.clone(),
            request.preference_name.clone(),
            request.preference_value.clone(),
        ));

        Ok(updated)
    }

    fn delete_preference(&self, request: &DeletePreferenceRequest) -> Result<PreferenceMap> {
        let updated = {
            let mut stores = self.stores.write();
            let store = stores
                .get_mut(&request.store_name)
                .ok_or_else(|| InspectorError::StoreNotFound(request.store_name.clone()))?;
            store.remove(&request.preference_name);
            store.clone()
        };

        self.emit(ChangeEvent::delete(
            request.store_name.clone(),
            request.preference_name.clone(),
        ));

        Ok(updated)
    }
}
