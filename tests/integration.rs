//! Integration tests for the preference inspector.

use preflens::{
    change_feed, ChangeEvent, DeletePreferenceRequest, DeviceClient, FileExchange, FsFileExchange,
    ImportedFile, InMemoryDevice, Inspector, InspectorConfig, InspectorError, MemoryNotifier,
    MemorySessionStore, PathSegment, PreferenceEntry, PreferenceMap, Result, SetPreferenceRequest,
    TreeEdit,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn seeded_device() -> Arc<InMemoryDevice> {
    Arc::new(
        InMemoryDevice::new()
            .with_store(
                "app_prefs",
                PreferenceMap::from([
                    ("theme".to_string(), json!("light")),
                    ("volume".to_string(), json!(3)),
                ]),
            )
            .with_store(
                "feature_flags",
                PreferenceMap::from([("new_ui".to_string(), json!(false))]),
            ),
    )
}

/// Device wrapper that rejects writes to one key.
struct FlakyDevice {
    inner: InMemoryDevice,
    fail_key: String,
}

impl DeviceClient for FlakyDevice {
    fn fetch_all(&self) -> Result<BTreeMap<String, PreferenceMap>> {
        self.inner.fetch_all()
    }

    fn set_preference(&self, request: &SetPreferenceRequest) -> Result<PreferenceMap> {
        if request.preference_name == self.fail_key {
            return Err(InspectorError::Device("write rejected".to_string()));
        }
        self.inner.set_preference(request)
    }

    fn delete_preference(&self, request: &DeletePreferenceRequest) -> Result<PreferenceMap> {
        self.inner.delete_preference(request)
    }
}

/// File exchange whose save path always fails.
struct BrokenExchange;

impl FileExchange for BrokenExchange {
    fn export_file(&self, _default_name: &str, _contents: &str) -> Result<PathBuf> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
    }

    fn import_file(&self) -> Result<Option<ImportedFile>> {
        Ok(None)
    }
}

// --- Connection & Live Feed ---

#[test]
fn test_connect_loads_snapshots_and_selects_first() {
    let inspector = Inspector::new(InspectorConfig::editor(), seeded_device());
    inspector.connect().unwrap();

    assert_eq!(inspector.store_names(), vec!["app_prefs", "feature_flags"]);
    assert_eq!(inspector.selected().as_deref(), Some("app_prefs"));

    let entry = inspector.selected_entry().unwrap();
    assert_eq!(entry.preferences["theme"], json!("light"));
    assert!(entry.changes.is_empty());
}

#[test]
fn test_pump_applies_events_in_arrival_order() {
    let device = seeded_device();
    let (publisher, feed) = change_feed(64);
    let inspector = Inspector::new(InspectorConfig::editor(), device);
    inspector.connect().unwrap();

    publisher.publish(ChangeEvent::set("app_prefs", "theme", json!("dark")));
    publisher.publish(ChangeEvent::set("app_prefs", "theme", json!("oled")));
    publisher.publish(ChangeEvent::delete("app_prefs", "volume"));

    assert_eq!(inspector.pump(&feed), 3);

    let entry = inspector.entry("app_prefs").unwrap();
    assert_eq!(entry.preferences["theme"], json!("oled"));
    assert!(!entry.preferences.contains_key("volume"));
    assert_eq!(entry.changes.len(), 3);
    assert!(entry.changes[0].deleted);
}

#[test]
fn test_unknown_store_event_dropped_for_editor() {
    let device = seeded_device();
    let (publisher, feed) = change_feed(8);
    let inspector = Inspector::new(InspectorConfig::editor(), device);
    inspector.connect().unwrap();

    publisher.publish(ChangeEvent::set("never_seen", "a", json!(1)));
    inspector.pump(&feed);

    assert!(inspector.entry("never_seen").is_none());
}

#[test]
fn test_unknown_store_event_creates_entry_for_viewer() {
    let device = seeded_device();
    let (publisher, feed) = change_feed(8);
    let inspector = Inspector::new(InspectorConfig::viewer(), device);
    inspector.connect().unwrap();

    publisher.publish(ChangeEvent::set("never_seen", "a", json!(1)));
    inspector.pump(&feed);

    let entry = inspector.entry("never_seen").unwrap();
    assert_eq!(entry.preferences["a"], json!([1]));
    assert_eq!(entry.changes.len(), 1);
}

// --- Dual-Path Updates ---

#[test]
fn test_duplicate_delivery_is_redundant_under_replace() {
    let device = seeded_device();
    let (publisher, feed) = change_feed(8);
    device.attach_publisher(publisher);

    let inspector = Inspector::new(InspectorConfig::editor(), device);
    inspector.connect().unwrap();

    // The response already applied the write; the mirrored event is the
    // second delivery of the same change.
    inspector
        .set_preference("app_prefs", "theme", json!("dark"))
        .unwrap();
    assert_eq!(inspector.pump(&feed), 1);

    let entry = inspector.entry("app_prefs").unwrap();
    assert_eq!(entry.preferences["theme"], json!("dark"));
    assert_eq!(entry.changes.len(), 1);
}

#[test]
fn test_duplicate_delivery_duplicates_list_entry_under_accumulate() {
    let device = seeded_device();
    let (publisher, feed) = change_feed(8);
    device.attach_publisher(publisher);

    let inspector = Inspector::new(InspectorConfig::viewer(), device);
    inspector.connect().unwrap();

    inspector
        .set_preference("app_prefs", "theme", json!("dark"))
        .unwrap();
    inspector.pump(&feed);

    // Response path mirrored the scalar, event path reseeded it as a
    // list and appended the duplicate.
    let entry = inspector.entry("app_prefs").unwrap();
    assert_eq!(entry.preferences["theme"], json!(["dark", "dark"]));
}

// --- Tree-Widget Edits ---

#[test]
fn test_tree_edit_resets_top_level_key_on_device() {
    let device = seeded_device();
    let inspector = Inspector::new(InspectorConfig::editor(), device.clone());
    inspector.connect().unwrap();
    inspector
        .set_preference("app_prefs", "limits", json!({"upload": 10, "download": 50}))
        .unwrap();

    // Edit of limits.upload deep in the tree.
    let edit = TreeEdit {
        name: Some(PathSegment::from("upload")),
        namespace: vec![None, Some(PathSegment::from("limits"))],
        edited_tree: json!({
            "theme": "light",
            "volume": 3,
            "limits": {"upload": 99, "download": 50},
        }),
    };
    inspector.apply_tree_edit(&edit).unwrap();

    assert_eq!(
        device.fetch_all().unwrap()["app_prefs"]["limits"],
        json!({"upload": 99, "download": 50})
    );
    assert_eq!(
        inspector.entry("app_prefs").unwrap().preferences["limits"]["upload"],
        json!(99)
    );
}

#[test]
fn test_tree_delete_depth_one_removes_key() {
    let device = seeded_device();
    let inspector = Inspector::new(InspectorConfig::editor(), device.clone());
    inspector.connect().unwrap();

    let edit = TreeEdit {
        name: Some(PathSegment::from("volume")),
        namespace: vec![None],
        edited_tree: json!({"theme": "light"}),
    };
    inspector.apply_tree_delete(&edit).unwrap();

    assert!(!device.fetch_all().unwrap()["app_prefs"].contains_key("volume"));
    assert!(!inspector
        .entry("app_prefs")
        .unwrap()
        .preferences
        .contains_key("volume"));
}

#[test]
fn test_tree_delete_nested_resets_top_level_key() {
    let device = seeded_device();
    let inspector = Inspector::new(InspectorConfig::editor(), device.clone());
    inspector.connect().unwrap();
    inspector
        .set_preference("app_prefs", "limits", json!({"upload": 10, "download": 50}))
        .unwrap();

    // Deleting limits.download folds into a re-set of limits.
    let edit = TreeEdit {
        name: Some(PathSegment::from("download")),
        namespace: vec![None, Some(PathSegment::from("limits"))],
        edited_tree: json!({
            "theme": "light",
            "volume": 3,
            "limits": {"upload": 10},
        }),
    };
    inspector.apply_tree_delete(&edit).unwrap();

    assert_eq!(
        device.fetch_all().unwrap()["app_prefs"]["limits"],
        json!({"upload": 10})
    );
}

// --- File Export / Import ---

#[test]
fn test_export_import_round_trip() {
    let dir = TempDir::new().unwrap();
    let exchange = Arc::new(FsFileExchange::new(dir.path().join("exports")).unwrap());

    let inspector = Inspector::new(InspectorConfig::editor(), seeded_device())
        .with_file_exchange(exchange.clone());
    inspector.connect().unwrap();
    inspector
        .set_preference("app_prefs", "theme", json!("dark"))
        .unwrap();

    let path = inspector.export_selected().unwrap().unwrap();
    let on_disk: PreferenceEntry =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, inspector.selected_entry().unwrap());

    // Import into a fresh session against a device missing those keys.
    let other_device =
        Arc::new(InMemoryDevice::new().with_store("app_prefs", PreferenceMap::new()));
    let other_exchange = Arc::new(FsFileExchange::new(dir.path().join("other")).unwrap());
    other_exchange.stage_import(&path);

    let other = Inspector::new(InspectorConfig::editor(), other_device.clone())
        .with_file_exchange(other_exchange);
    other.connect().unwrap();
    other.import_selected().unwrap();

    let imported = other.entry("app_prefs").unwrap();
    assert_eq!(imported.preferences, on_disk.preferences);
    // Replay converged the device to the imported snapshot.
    assert_eq!(
        other_device.fetch_all().unwrap()["app_prefs"],
        on_disk.preferences
    );
}

#[test]
fn test_viewer_import_keeps_device_untouched() {
    let dir = TempDir::new().unwrap();
    let exchange = Arc::new(FsFileExchange::new(dir.path()).unwrap());
    let entry = PreferenceEntry::from_snapshot(PreferenceMap::from([(
        "theme".to_string(),
        json!("dark"),
    )]));
    let path = exchange
        .export_file("app_prefs", &serde_json::to_string(&entry).unwrap())
        .unwrap();
    exchange.stage_import(&path);

    let device = seeded_device();
    let inspector =
        Inspector::new(InspectorConfig::viewer(), device.clone()).with_file_exchange(exchange);
    inspector.connect().unwrap();
    inspector.import_selected().unwrap();

    assert_eq!(
        inspector.entry("app_prefs").unwrap().preferences["theme"],
        json!("dark")
    );
    // No replay in the viewer configuration.
    assert_eq!(
        device.fetch_all().unwrap()["app_prefs"]["theme"],
        json!("light")
    );
}

#[test]
fn test_import_replay_partial_failure_leaves_mixed_state() {
    let dir = TempDir::new().unwrap();
    let exchange = Arc::new(FsFileExchange::new(dir.path()).unwrap());
    let entry = PreferenceEntry::from_snapshot(PreferenceMap::from([
        ("alpha".to_string(), json!(1)),
        ("beta".to_string(), json!(2)),
        ("gamma".to_string(), json!(3)),
    ]));
    let path = exchange
        .export_file("app_prefs", &serde_json::to_string(&entry).unwrap())
        .unwrap();
    exchange.stage_import(&path);

    let device = Arc::new(FlakyDevice {
        inner: InMemoryDevice::new().with_store("app_prefs", PreferenceMap::new()),
        fail_key: "beta".to_string(),
    });
    let inspector =
        Inspector::new(InspectorConfig::editor(), device.clone()).with_file_exchange(exchange);
    inspector.connect().unwrap();

    let result = inspector.import_selected();
    assert!(matches!(result, Err(InspectorError::Device(_))));

    // Keys replayed before the failure stuck, the rest never arrived;
    // the local view still has the full imported map.
    let on_device = &device.fetch_all().unwrap()["app_prefs"];
    assert_eq!(on_device.get("alpha"), Some(&json!(1)));
    assert_eq!(on_device.get("beta"), None);
    assert_eq!(on_device.get("gamma"), None);
    assert_eq!(
        inspector.entry("app_prefs").unwrap().preferences,
        entry.preferences
    );
}

#[test]
fn test_import_with_nothing_staged_is_noop() {
    let dir = TempDir::new().unwrap();
    let exchange = Arc::new(FsFileExchange::new(dir.path()).unwrap());
    let inspector =
        Inspector::new(InspectorConfig::editor(), seeded_device()).with_file_exchange(exchange);
    inspector.connect().unwrap();

    let before = inspector.selected_entry().unwrap();
    inspector.import_selected().unwrap();
    assert_eq!(inspector.selected_entry().unwrap(), before);
}

#[test]
fn test_import_garbage_propagates_parse_fault() {
    let dir = TempDir::new().unwrap();
    let exchange = Arc::new(FsFileExchange::new(dir.path()).unwrap());
    let path = exchange.export_file("app_prefs", "not json at all").unwrap();
    exchange.stage_import(&path);

    let inspector =
        Inspector::new(InspectorConfig::editor(), seeded_device()).with_file_exchange(exchange);
    inspector.connect().unwrap();

    assert!(matches!(
        inspector.import_selected(),
        Err(InspectorError::Deserialization(_))
    ));
}

#[test]
fn test_export_failure_surfaces_notification() {
    let notifier = Arc::new(MemoryNotifier::new());
    let inspector = Inspector::new(InspectorConfig::editor(), seeded_device())
        .with_file_exchange(Arc::new(BrokenExchange))
        .with_notifier(notifier.clone());
    inspector.connect().unwrap();

    // Swallowed: the failure surfaces only as a notification.
    assert_eq!(inspector.export_selected().unwrap(), None);

    let captured = notifier.take();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].message, "Save failed");
    assert!(captured[0].description.contains("app_prefs"));
}

// --- Session Persistence ---

#[test]
fn test_session_save_restore_round_trip() {
    let sessions = Arc::new(MemorySessionStore::new());
    let device = seeded_device();
    let (publisher, feed) = change_feed(8);

    let inspector = Inspector::new(InspectorConfig::editor(), device.clone())
        .with_session_store(sessions.clone());
    inspector.connect().unwrap();
    publisher.publish(ChangeEvent::set("app_prefs", "theme", json!("dark")));
    inspector.pump(&feed);
    inspector.select_store("feature_flags").unwrap();
    inspector.save_session().unwrap();

    // A later session starts from the persisted view, change log included.
    let restored = Inspector::new(InspectorConfig::editor(), device).with_session_store(sessions);
    assert!(restored.restore_session().unwrap());
    assert_eq!(restored.selected().as_deref(), Some("feature_flags"));

    let entry = restored.entry("app_prefs").unwrap();
    assert_eq!(entry.preferences["theme"], json!("dark"));
    assert_eq!(entry.changes.len(), 1);
}

#[test]
fn test_restore_without_saved_session() {
    let sessions = Arc::new(MemorySessionStore::new());
    let inspector =
        Inspector::new(InspectorConfig::editor(), seeded_device()).with_session_store(sessions);
    assert!(!inspector.restore_session().unwrap());
    assert_eq!(inspector.selected(), None);
}
