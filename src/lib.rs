//! # Preference Inspector
//!
//! A live view of an instrumented application's named preference stores:
//! current key/value state plus a chronological change log, with edit and
//! file export/import support for debugging sessions.
//!
//! ## Core Concepts
//!
//! - **Stores**: Named preference maps observed from the device
//! - **Change events**: Set/delete mutations pushed over a live feed
//! - **Write policies**: Accumulate every value per key, or mirror the
//!   live store by replacing
//! - **Host capabilities**: File dialogs, notifications, and session
//!   persistence injected as traits
//!
//! ## Example
//!
//! ```ignore
//! use preflens::{change_feed, InMemoryDevice, Inspector, InspectorConfig};
//! use std::sync::Arc;
//!
//! let device = Arc::new(InMemoryDevice::new());
//! let (publisher, feed) = change_feed(1000);
//! device.attach_publisher(publisher);
//!
//! let inspector = Inspector::new(InspectorConfig::editor(), device);
//! inspector.connect()?;
//!
//! // Apply whatever the device pushed since the last turn of the loop.
//! inspector.pump(&feed);
//!
//! inspector.set_preference("app_prefs", "theme", "dark".into())?;
//! ```

pub mod client;
pub mod error;
pub mod feed;
pub mod host;
pub mod inspector;
pub mod json;
pub mod reducer;
pub mod types;

// Re-exports
pub use client::{DeletePreferenceRequest, DeviceClient, InMemoryDevice, SetPreferenceRequest};
pub use error::{InspectorError, Result};
pub use feed::{change_feed, ChangeFeed, ChangePublisher, DEFAULT_FEED_CAPACITY};
pub use host::{
    FileExchange, FsFileExchange, ImportedFile, JsonSessionStore, MemoryNotifier,
    MemorySessionStore, Notification, Notifier, NullNotifier, SessionStore,
};
pub use inspector::{Inspector, InspectorConfig};
pub use json::{extract, PathSegment, TreeEdit};
pub use reducer::{apply_change, fold_snapshot, ChangeOutcome};
pub use types::*;
